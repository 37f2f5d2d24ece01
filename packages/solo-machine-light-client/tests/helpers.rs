//! Common test utilities and fixtures

#![allow(dead_code)]

use ed25519_dalek::{Signer, SigningKey};
use ibc_proto::ibc::core::channel::v1::Channel;
use ibc_proto::ibc::core::connection::v1::ConnectionEnd;
use ibc_proto::ibc::lightclients::tendermint::v1::ConsensusState as TendermintConsensusState;
use prost::Message;
use solo_machine_light_client::{
    path, ClientState, ConsensusState, DataType, MerklePrefix, ProofCodec, PublicKey,
    SignedProof, SoloMachineError, VerifyArgs,
};

pub const CLIENT_ID: &str = "06-solomachine-7";
pub const PORT: &str = "transfer";
pub const CHANNEL: &str = "channel-0";
pub const CONNECTION: &str = "connection-0";
pub const COUNTERPARTY_CLIENT: &str = "07-tendermint-0";
pub const PACKET_SEQUENCE: u64 = 1;

pub fn prefix() -> MerklePrefix {
    MerklePrefix::new("ibc")
}

/// Installs a log subscriber so failures come with the client's traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// The solo machine on the other side: an Ed25519 key.
pub struct SoloMachine {
    key: SigningKey,
}

impl SoloMachine {
    pub fn new(seed: u8) -> Self {
        Self {
            key: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::Ed25519(self.key.verifying_key())
    }

    pub fn client(&self, sequence: u64, timestamp: u64) -> ClientState {
        ClientState::new(
            CLIENT_ID,
            "solo-machine",
            ConsensusState::new(self.public_key(), sequence, timestamp),
        )
    }

    /// Signs what `op` verifies for a client currently at `sequence`.
    pub fn prove(&self, op: Op, sequence: u64, timestamp: u64) -> Vec<u8> {
        let codec = ProofCodec::default();
        let path = prefix().apply(op.path()).expect("non-empty prefix and path");
        let sign_bytes = codec.sign_bytes(sequence, timestamp, &path, op.data_type(), op.data());
        codec.encode_proof(&SignedProof {
            timestamp,
            signature: self.key.sign(&sign_bytes).to_bytes().to_vec(),
            new_public_key: None,
        })
    }
}

pub fn connection_end() -> ConnectionEnd {
    ConnectionEnd {
        client_id: COUNTERPARTY_CLIENT.to_string(),
        state: 3,
        delay_period: 0,
        ..Default::default()
    }
}

pub fn channel_end() -> Channel {
    Channel {
        state: 3,
        ordering: 1,
        connection_hops: vec![CONNECTION.to_string()],
        version: "ics20-1".to_string(),
        ..Default::default()
    }
}

pub fn counterparty_consensus_state() -> TendermintConsensusState {
    TendermintConsensusState {
        next_validators_hash: vec![0xab; 32],
        ..Default::default()
    }
}

/// The seven verifications with fixed arguments.
#[derive(Clone, Copy, Debug)]
pub enum Op {
    ClientConsensusState,
    ConnectionState,
    ChannelState,
    PacketCommitment,
    PacketAcknowledgement,
    PacketAcknowledgementAbsence,
    NextSequenceRecv,
}

impl Op {
    pub const ALL: [Self; 7] = [
        Self::ClientConsensusState,
        Self::ConnectionState,
        Self::ChannelState,
        Self::PacketCommitment,
        Self::PacketAcknowledgement,
        Self::PacketAcknowledgementAbsence,
        Self::NextSequenceRecv,
    ];

    pub fn path(self) -> String {
        match self {
            Self::ClientConsensusState => path::consensus_state_path(COUNTERPARTY_CLIENT, 10),
            Self::ConnectionState => path::connection_path(CONNECTION),
            Self::ChannelState => path::channel_path(PORT, CHANNEL),
            Self::PacketCommitment => {
                path::packet_commitment_path(PORT, CHANNEL, PACKET_SEQUENCE)
            }
            Self::PacketAcknowledgement | Self::PacketAcknowledgementAbsence => {
                path::packet_acknowledgement_path(PORT, CHANNEL, PACKET_SEQUENCE)
            }
            Self::NextSequenceRecv => path::next_sequence_recv_path(PORT, CHANNEL),
        }
    }

    pub const fn data_type(self) -> DataType {
        match self {
            Self::ClientConsensusState => DataType::ConsensusState,
            Self::ConnectionState => DataType::ConnectionState,
            Self::ChannelState => DataType::ChannelState,
            Self::PacketCommitment => DataType::PacketCommitment,
            Self::PacketAcknowledgement => DataType::PacketAcknowledgement,
            Self::PacketAcknowledgementAbsence => DataType::PacketAcknowledgementAbsence,
            Self::NextSequenceRecv => DataType::NextSequenceRecv,
        }
    }

    pub fn data(self) -> Vec<u8> {
        match self {
            Self::ClientConsensusState => counterparty_consensus_state().encode_to_vec(),
            Self::ConnectionState => connection_end().encode_to_vec(),
            Self::ChannelState => channel_end().encode_to_vec(),
            Self::PacketCommitment => b"packet commitment".to_vec(),
            Self::PacketAcknowledgement => b"packet acknowledgement".to_vec(),
            Self::PacketAcknowledgementAbsence => Vec::new(),
            Self::NextSequenceRecv => 4u64.to_be_bytes().to_vec(),
        }
    }

    /// Runs the verification against `client`.
    pub fn verify(
        self,
        client: &ClientState,
        codec: &ProofCodec,
        args: &VerifyArgs<'_>,
    ) -> Result<ClientState, SoloMachineError> {
        match self {
            Self::ClientConsensusState => client.verify_client_consensus_state(
                codec,
                args,
                COUNTERPARTY_CLIENT,
                10,
                &counterparty_consensus_state(),
            ),
            Self::ConnectionState => {
                client.verify_connection_state(codec, args, CONNECTION, &connection_end())
            }
            Self::ChannelState => {
                client.verify_channel_state(codec, args, PORT, CHANNEL, &channel_end())
            }
            Self::PacketCommitment => client.verify_packet_commitment(
                codec,
                args,
                PORT,
                CHANNEL,
                PACKET_SEQUENCE,
                b"packet commitment",
            ),
            Self::PacketAcknowledgement => client.verify_packet_acknowledgement(
                codec,
                args,
                PORT,
                CHANNEL,
                PACKET_SEQUENCE,
                b"packet acknowledgement",
            ),
            Self::PacketAcknowledgementAbsence => client.verify_packet_acknowledgement_absence(
                codec,
                args,
                PORT,
                CHANNEL,
                PACKET_SEQUENCE,
            ),
            Self::NextSequenceRecv => {
                client.verify_next_sequence_recv(codec, args, PORT, CHANNEL, 4)
            }
        }
    }
}
