//! Public keys of the solo machine and raw signature verification.
//!
//! Ed25519 signatures are 64 bytes and checked with strict verification.
//! Secp256k1 signatures are 64 byte `r || s` over the SHA-256 digest of the
//! message, and high `s` values are rejected.

use k256::ecdsa::signature::Verifier as _;
use serde::{Deserialize, Serialize};

use crate::{error::SoloMachineError, proto};

/// Length of an Ed25519 public key.
pub const ED25519_PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

/// The key the solo machine signs with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPublicKey", into = "RawPublicKey")]
pub enum PublicKey {
    /// Ed25519 key
    Ed25519(ed25519_dalek::VerifyingKey),
    /// Secp256k1 ECDSA key
    Secp256k1(k256::ecdsa::VerifyingKey),
}

/// Failure to verify a signature.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature bytes cannot be parsed for the key's algorithm
    #[error("malformed {algorithm} signature: {reason}")]
    Malformed {
        /// Signature algorithm
        algorithm: &'static str,
        /// Reason for error
        reason: String,
    },
    /// Well formed signature that does not verify
    #[error("signature does not match the {algorithm} public key")]
    Mismatch {
        /// Signature algorithm
        algorithm: &'static str,
    },
}

impl PublicKey {
    /// Parses a 32 byte Ed25519 key.
    ///
    /// # Errors
    /// Returns [`SoloMachineError::InvalidPublicKey`] if the bytes are not a valid key.
    pub fn ed25519_from_bytes(bytes: &[u8]) -> Result<Self, SoloMachineError> {
        let bytes: &[u8; ED25519_PUBLIC_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| SoloMachineError::InvalidPublicKey {
                    reason: format!(
                        "ed25519 key must be {ED25519_PUBLIC_KEY_LENGTH} bytes, found {}",
                        bytes.len()
                    ),
                })?;
        ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map(Self::Ed25519)
            .map_err(|e| SoloMachineError::InvalidPublicKey {
                reason: e.to_string(),
            })
    }

    /// Parses a SEC1 encoded secp256k1 key.
    ///
    /// # Errors
    /// Returns [`SoloMachineError::InvalidPublicKey`] if the bytes are not a valid key.
    pub fn secp256k1_from_bytes(bytes: &[u8]) -> Result<Self, SoloMachineError> {
        k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
            .map(Self::Secp256k1)
            .map_err(|e| SoloMachineError::InvalidPublicKey {
                reason: format!("secp256k1: {e}"),
            })
    }

    /// Name of the signature algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => "ed25519",
            Self::Secp256k1(_) => "secp256k1",
        }
    }

    /// Raw key bytes, compressed for secp256k1.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(key) => key.to_bytes().to_vec(),
            Self::Secp256k1(key) => key.to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    /// Checks `signature` over `message`.
    ///
    /// # Errors
    /// Returns [`SignatureError::Malformed`] if the signature cannot be parsed and
    /// [`SignatureError::Mismatch`] if it does not verify.
    pub fn verify_signature(&self, message: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        let algorithm = self.algorithm();
        let malformed = |reason: String| SignatureError::Malformed { algorithm, reason };
        let mismatch = SignatureError::Mismatch { algorithm };

        match self {
            Self::Ed25519(key) => {
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|e| malformed(e.to_string()))?;
                key.verify_strict(message, &signature).map_err(|_| mismatch)
            }
            Self::Secp256k1(key) => {
                let signature = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|e| malformed(e.to_string()))?;
                key.verify(message, &signature).map_err(|_| mismatch)
            }
        }
    }
}

impl TryFrom<&proto::PublicKey> for PublicKey {
    type Error = SoloMachineError;

    fn try_from(key: &proto::PublicKey) -> Result<Self, Self::Error> {
        match &key.sum {
            Some(proto::public_key::Sum::Ed25519(bytes)) => Self::ed25519_from_bytes(bytes),
            Some(proto::public_key::Sum::Secp256k1(bytes)) => Self::secp256k1_from_bytes(bytes),
            None => Err(SoloMachineError::InvalidPublicKey {
                reason: "public key is empty".to_string(),
            }),
        }
    }
}

impl From<&PublicKey> for proto::PublicKey {
    fn from(key: &PublicKey) -> Self {
        let sum = match key {
            PublicKey::Ed25519(_) => proto::public_key::Sum::Ed25519(key.to_bytes()),
            PublicKey::Secp256k1(_) => proto::public_key::Sum::Secp256k1(key.to_bytes()),
        };
        Self { sum: Some(sum) }
    }
}

/// JSON form of [`PublicKey`].
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", content = "key", rename_all = "snake_case")]
enum RawPublicKey {
    Ed25519(#[serde(with = "ibc_solo_machine_utils::serde::base64_bytes")] Vec<u8>),
    Secp256k1(#[serde(with = "ibc_solo_machine_utils::serde::base64_bytes")] Vec<u8>),
}

impl TryFrom<RawPublicKey> for PublicKey {
    type Error = SoloMachineError;

    fn try_from(raw: RawPublicKey) -> Result<Self, Self::Error> {
        match raw {
            RawPublicKey::Ed25519(bytes) => Self::ed25519_from_bytes(&bytes),
            RawPublicKey::Secp256k1(bytes) => Self::secp256k1_from_bytes(&bytes),
        }
    }
}

impl From<PublicKey> for RawPublicKey {
    fn from(key: PublicKey) -> Self {
        match key {
            PublicKey::Ed25519(_) => Self::Ed25519(key.to_bytes()),
            PublicKey::Secp256k1(_) => Self::Secp256k1(key.to_bytes()),
        }
    }
}
