//! The seven state verifications.
//!
//! Each verification checks the preconditions, signs the prefixed path and the
//! payload together with the client's current sequence and the signature time,
//! checks the signature with the current key, and returns the successor client
//! state. Nothing is written anywhere; persisting the returned state is the
//! caller's job.

use prost::Message;

use crate::{
    client_state::ClientState,
    consensus_state::AnyConsensusState,
    error::SoloMachineError,
    guard,
    path::{self, MerklePrefix},
    proof::ProofCodec,
    sign_bytes::DataType,
};

/// Arguments shared by all verifications.
#[derive(Clone, Copy, Debug)]
pub struct VerifyArgs<'a> {
    /// Sequence the caller expects the proof to be valid at. Must not be
    /// ahead of the client.
    pub sequence: u64,
    /// Commitment prefix of the counterparty
    pub prefix: Option<&'a MerklePrefix>,
    /// Opaque proof bytes
    pub proof: &'a [u8],
}

impl<'a> VerifyArgs<'a> {
    /// Creates the arguments.
    #[must_use]
    pub const fn new(sequence: u64, prefix: &'a MerklePrefix, proof: &'a [u8]) -> Self {
        Self {
            sequence,
            prefix: Some(prefix),
            proof,
        }
    }
}

impl ClientState {
    /// Verifies the consensus state a counterparty client stores at `consensus_height`.
    ///
    /// # Errors
    /// Returns a precondition error or [`SoloMachineError::VerificationFailed`].
    pub fn verify_client_consensus_state(
        &self,
        codec: &ProofCodec,
        args: &VerifyArgs<'_>,
        counterparty_client_id: &str,
        consensus_height: u64,
        consensus_state: &impl Message,
    ) -> Result<Self, SoloMachineError> {
        self.verify_signed_data(
            codec,
            args,
            path::consensus_state_path(counterparty_client_id, consensus_height),
            DataType::ConsensusState,
            consensus_state.encode_to_vec(),
        )
    }

    /// Verifies a connection end.
    ///
    /// # Errors
    /// Returns a precondition error or [`SoloMachineError::VerificationFailed`].
    pub fn verify_connection_state(
        &self,
        codec: &ProofCodec,
        args: &VerifyArgs<'_>,
        connection_id: &str,
        connection_end: &impl Message,
    ) -> Result<Self, SoloMachineError> {
        self.verify_signed_data(
            codec,
            args,
            path::connection_path(connection_id),
            DataType::ConnectionState,
            connection_end.encode_to_vec(),
        )
    }

    /// Verifies a channel end.
    ///
    /// # Errors
    /// Returns a precondition error or [`SoloMachineError::VerificationFailed`].
    pub fn verify_channel_state(
        &self,
        codec: &ProofCodec,
        args: &VerifyArgs<'_>,
        port_id: &str,
        channel_id: &str,
        channel: &impl Message,
    ) -> Result<Self, SoloMachineError> {
        self.verify_signed_data(
            codec,
            args,
            path::channel_path(port_id, channel_id),
            DataType::ChannelState,
            channel.encode_to_vec(),
        )
    }

    /// Verifies an outgoing packet commitment.
    ///
    /// # Errors
    /// Returns a precondition error or [`SoloMachineError::VerificationFailed`].
    pub fn verify_packet_commitment(
        &self,
        codec: &ProofCodec,
        args: &VerifyArgs<'_>,
        port_id: &str,
        channel_id: &str,
        packet_sequence: u64,
        commitment: &[u8],
    ) -> Result<Self, SoloMachineError> {
        self.verify_signed_data(
            codec,
            args,
            path::packet_commitment_path(port_id, channel_id, packet_sequence),
            DataType::PacketCommitment,
            commitment.to_vec(),
        )
    }

    /// Verifies an acknowledgement of an incoming packet.
    ///
    /// # Errors
    /// Returns a precondition error or [`SoloMachineError::VerificationFailed`].
    pub fn verify_packet_acknowledgement(
        &self,
        codec: &ProofCodec,
        args: &VerifyArgs<'_>,
        port_id: &str,
        channel_id: &str,
        packet_sequence: u64,
        acknowledgement: &[u8],
    ) -> Result<Self, SoloMachineError> {
        self.verify_signed_data(
            codec,
            args,
            path::packet_acknowledgement_path(port_id, channel_id, packet_sequence),
            DataType::PacketAcknowledgement,
            acknowledgement.to_vec(),
        )
    }

    /// Verifies that no acknowledgement exists for an incoming packet.
    ///
    /// # Errors
    /// Returns a precondition error or [`SoloMachineError::VerificationFailed`].
    pub fn verify_packet_acknowledgement_absence(
        &self,
        codec: &ProofCodec,
        args: &VerifyArgs<'_>,
        port_id: &str,
        channel_id: &str,
        packet_sequence: u64,
    ) -> Result<Self, SoloMachineError> {
        self.verify_signed_data(
            codec,
            args,
            path::packet_acknowledgement_path(port_id, channel_id, packet_sequence),
            DataType::PacketAcknowledgementAbsence,
            Vec::new(),
        )
    }

    /// Verifies the next receive sequence of a channel. The sequence is signed
    /// as 8 big endian bytes.
    ///
    /// # Errors
    /// Returns a precondition error or [`SoloMachineError::VerificationFailed`].
    pub fn verify_next_sequence_recv(
        &self,
        codec: &ProofCodec,
        args: &VerifyArgs<'_>,
        port_id: &str,
        channel_id: &str,
        next_sequence_recv: u64,
    ) -> Result<Self, SoloMachineError> {
        self.verify_signed_data(
            codec,
            args,
            path::next_sequence_recv_path(port_id, channel_id),
            DataType::NextSequenceRecv,
            next_sequence_recv.to_be_bytes().to_vec(),
        )
    }

    #[tracing::instrument(
        skip_all,
        fields(client_id = %self.client_id, kind = %data_type, path = %path)
    )]
    fn verify_signed_data(
        &self,
        codec: &ProofCodec,
        args: &VerifyArgs<'_>,
        path: String,
        data_type: DataType,
        data: Vec<u8>,
    ) -> Result<Self, SoloMachineError> {
        let consensus_state = AnyConsensusState::SoloMachine(self.consensus_state.clone());
        let signed = guard::check_preconditions(
            codec,
            self,
            args.sequence,
            args.prefix,
            args.proof,
            Some(&consensus_state),
        )?;

        let prefix = args
            .prefix
            .ok_or_else(|| SoloMachineError::invalid_prefix("prefix cannot be nil"))?;
        let path = prefix.apply(path)?;

        let sign_bytes = codec.sign_bytes(
            self.consensus_state.sequence,
            signed.timestamp,
            &path,
            data_type,
            data,
        );
        self.consensus_state
            .public_key
            .verify_signature(&sign_bytes, &signed.signature)
            .map_err(|source| {
                tracing::debug!(
                    %source,
                    public_key = %hex::encode(self.consensus_state.public_key.to_bytes()),
                    "signature rejected"
                );
                SoloMachineError::VerificationFailed {
                    kind: data_type,
                    source,
                }
            })?;

        let next = self.successor(&signed)?;
        tracing::info!(
            sequence = next.consensus_state.sequence,
            timestamp = next.consensus_state.timestamp,
            rotated = signed.new_public_key.is_some(),
            "verified solo machine signature"
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::SignatureError,
        test_utils::{client_state, TestSigner},
    };

    const PORT: &str = "transfer";
    const CHANNEL: &str = "channel-0";

    fn prefix() -> MerklePrefix {
        MerklePrefix::new("ibc")
    }

    #[test]
    fn commitment_succeeds_and_ratchets() {
        let signer = TestSigner::ed25519(1);
        let client = client_state(&signer, 5, 100);
        let codec = ProofCodec::default();
        let path = prefix()
            .apply(path::packet_commitment_path(PORT, CHANNEL, 1))
            .unwrap();
        let proof = signer.sign_proof(
            &codec,
            5,
            150,
            &path,
            DataType::PacketCommitment,
            b"commitment".to_vec(),
            None,
        );

        let next = client
            .verify_packet_commitment(
                &codec,
                &VerifyArgs::new(5, &prefix(), &proof),
                PORT,
                CHANNEL,
                1,
                b"commitment",
            )
            .unwrap();
        assert_eq!(next.consensus_state.sequence, 6);
        assert_eq!(next.consensus_state.timestamp, 150);
        assert_eq!(client.consensus_state.sequence, 5);
    }

    #[test]
    fn signature_for_another_data_type_fails() {
        let signer = TestSigner::secp256k1(1);
        let client = client_state(&signer, 5, 100);
        let codec = ProofCodec::default();
        let path = prefix()
            .apply(path::packet_acknowledgement_path(PORT, CHANNEL, 1))
            .unwrap();
        // an acknowledgement signature replayed as an absence claim
        let proof = signer.sign_proof(
            &codec,
            5,
            150,
            &path,
            DataType::PacketAcknowledgement,
            Vec::new(),
            None,
        );

        let res = client.verify_packet_acknowledgement_absence(
            &codec,
            &VerifyArgs::new(5, &prefix(), &proof),
            PORT,
            CHANNEL,
            1,
        );
        assert!(matches!(
            res,
            Err(SoloMachineError::VerificationFailed {
                kind: DataType::PacketAcknowledgementAbsence,
                source: SignatureError::Mismatch { .. }
            })
        ));
    }

    #[test]
    fn next_sequence_recv_checks_the_decoded_signature() {
        let signer = TestSigner::ed25519(3);
        let client = client_state(&signer, 2, 10);
        let codec = ProofCodec::default();
        let path = prefix()
            .apply(path::next_sequence_recv_path(PORT, CHANNEL))
            .unwrap();
        let proof = signer.sign_proof(
            &codec,
            2,
            10,
            &path,
            DataType::NextSequenceRecv,
            7u64.to_be_bytes().to_vec(),
            None,
        );
        let prefix = prefix();
        let args = VerifyArgs::new(2, &prefix, &proof);

        let next = client
            .verify_next_sequence_recv(&codec, &args, PORT, CHANNEL, 7)
            .unwrap();
        assert_eq!(next.latest_height(), 3);

        assert!(matches!(
            client.verify_next_sequence_recv(&codec, &args, PORT, CHANNEL, 8),
            Err(SoloMachineError::VerificationFailed {
                kind: DataType::NextSequenceRecv,
                ..
            })
        ));
    }

    #[test]
    fn rotated_key_signs_the_next_proof() {
        let old = TestSigner::ed25519(1);
        let new = TestSigner::secp256k1(2);
        let client = client_state(&old, 1, 1);
        let codec = ProofCodec::default();
        let path = prefix().apply(path::connection_path("connection-0")).unwrap();
        let data = b"connection".to_vec();

        let rotate = old.sign_proof(
            &codec,
            1,
            2,
            &path,
            DataType::ConnectionState,
            data.clone(),
            Some(new.public_key()),
        );
        let rotated = client
            .verify_signed_data(
                &codec,
                &VerifyArgs::new(1, &prefix(), &rotate),
                path::connection_path("connection-0"),
                DataType::ConnectionState,
                data.clone(),
            )
            .unwrap();
        assert_eq!(rotated.consensus_state.public_key, new.public_key());

        let kind = DataType::ConnectionState;
        let by_old = old.sign_proof(&codec, 2, 3, &path, kind, data.clone(), None);
        let res = rotated.verify_signed_data(
            &codec,
            &VerifyArgs::new(2, &prefix(), &by_old),
            path::connection_path("connection-0"),
            DataType::ConnectionState,
            data.clone(),
        );
        assert!(matches!(res, Err(SoloMachineError::VerificationFailed { .. })));

        let by_new = new.sign_proof(&codec, 2, 3, &path, kind, data.clone(), None);
        let next = rotated
            .verify_signed_data(
                &codec,
                &VerifyArgs::new(2, &prefix(), &by_new),
                path::connection_path("connection-0"),
                DataType::ConnectionState,
                data,
            )
            .unwrap();
        assert_eq!(next.latest_height(), 3);
    }
}
