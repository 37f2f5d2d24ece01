//! The proof codec.
//!
//! A proof is the length prefixed encoding of a [`proto::TimestampedSignature`].
//! The codec is a plain value carrying its limits; every verification is handed
//! the codec it should use.

use ibc_solo_machine_utils::ensure;
use prost::Message;

use crate::{
    crypto::PublicKey,
    error::SoloMachineError,
    path::MerklePath,
    proto,
    sign_bytes::{self, DataType},
};

/// Default upper bound on the encoded proof size.
pub const DEFAULT_MAX_PROOF_SIZE: usize = 64 * 1024;

/// A decoded proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedProof {
    /// Moment the signature certifies
    pub timestamp: u64,
    /// Raw signature over the sign bytes
    pub signature: Vec<u8>,
    /// Key the client rotates to once the proof is accepted
    pub new_public_key: Option<PublicKey>,
}

/// Encodes and decodes proofs and builds sign bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofCodec {
    max_proof_size: usize,
}

impl Default for ProofCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROOF_SIZE)
    }
}

impl ProofCodec {
    /// Creates a codec rejecting proofs longer than `max_proof_size` bytes.
    #[must_use]
    pub const fn new(max_proof_size: usize) -> Self {
        Self { max_proof_size }
    }

    /// The configured proof size limit.
    #[must_use]
    pub const fn max_proof_size(&self) -> usize {
        self.max_proof_size
    }

    /// Encodes `proof` into the opaque proof bytes.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn encode_proof(&self, proof: &SignedProof) -> Vec<u8> {
        proto::TimestampedSignature {
            signature: proof.signature.clone(),
            timestamp: proof.timestamp,
            new_public_key: proof.new_public_key.as_ref().map(Into::into),
        }
        .encode_length_delimited_to_vec()
    }

    /// Decodes opaque proof bytes.
    ///
    /// # Errors
    /// Returns [`SoloMachineError::InvalidProof`] if the proof is empty, too
    /// large, malformed, carries trailing bytes, has no signature or rotates to
    /// an invalid key.
    pub fn decode_proof(&self, bytes: &[u8]) -> Result<SignedProof, SoloMachineError> {
        ensure!(
            !bytes.is_empty(),
            SoloMachineError::invalid_proof("proof cannot be empty")
        );
        ensure!(
            bytes.len() <= self.max_proof_size,
            SoloMachineError::invalid_proof(format!(
                "proof is {} bytes, the limit is {}",
                bytes.len(),
                self.max_proof_size
            ))
        );

        let mut buf = bytes;
        let raw = proto::TimestampedSignature::decode_length_delimited(&mut buf).map_err(|e| {
            SoloMachineError::invalid_proof(format!("failed to decode timestamped signature: {e}"))
        })?;
        ensure!(
            buf.is_empty(),
            SoloMachineError::invalid_proof(format!("{} trailing bytes after proof", buf.len()))
        );
        ensure!(
            !raw.signature.is_empty(),
            SoloMachineError::invalid_proof("signature cannot be empty")
        );

        let new_public_key = raw
            .new_public_key
            .as_ref()
            .map(PublicKey::try_from)
            .transpose()
            .map_err(|e| SoloMachineError::invalid_proof(format!("invalid new public key: {e}")))?;

        Ok(SignedProof {
            timestamp: raw.timestamp,
            signature: raw.signature,
            new_public_key,
        })
    }

    /// Builds the bytes a solo machine signs to attest `data` at `path`.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn sign_bytes(
        &self,
        sequence: u64,
        timestamp: u64,
        path: &MerklePath,
        data_type: DataType,
        data: Vec<u8>,
    ) -> Vec<u8> {
        sign_bytes::sign_bytes(sequence, timestamp, path, data_type, data)
    }
}
