//! This module defines [`ProofOpError`].

/// Errors produced while decoding or running proof operators.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum ProofOpError {
    /// The claimed keys and values do not pair up
    #[error("malformed claim: {keys} keys but {values} values")]
    MalformedClaim {
        /// Number of claimed keys
        keys: usize,
        /// Number of claimed values
        values: usize,
    },

    /// A claimed pair is not proven by the inner proof
    #[error("verification of claimed item {index} failed: {reason}")]
    ItemVerificationFailed {
        /// Position of the offending pair in the claim
        index: usize,
        /// Reason for the failure
        reason: String,
    },

    /// The inner proof is not self-consistent
    #[error("root computation failed: {reason}")]
    RootComputationFailed {
        /// Reason for the failure
        reason: String,
    },

    /// A wire envelope carried a type tag that no decoder accepts
    #[error("unknown proof operator type, expected {expected} but found {actual}")]
    UnknownOperatorType {
        /// The tag(s) the decoder accepts
        expected: String,
        /// The tag found on the envelope
        actual: String,
    },

    /// A decoder is already registered for the tag
    #[error("proof operator type {0} is already registered")]
    DuplicateOperatorType(String),

    /// An operator received the wrong number of inputs
    #[error("invalid number of arguments, expected {expected} but found {actual}")]
    InvalidArgs {
        /// Expected number of arguments
        expected: usize,
        /// Number of arguments received
        actual: usize,
    },

    /// The leaf committed to by a proof differs from the hashed input
    #[error(
        "leaf hash mismatch, proof commits to {expected_hex} but input hashes to {actual_hex}",
        expected_hex = hex::encode(.expected),
        actual_hex = hex::encode(.actual)
    )]
    LeafMismatch {
        /// Leaf hash stored in the proof
        expected: Vec<u8>,
        /// Leaf hash computed from the input
        actual: Vec<u8>,
    },

    /// An operator envelope carried bytes past the encoded operator
    #[error("{op_type} proof data has {remaining} trailing bytes")]
    TrailingBytes {
        /// Type tag of the envelope
        op_type: String,
        /// Number of bytes left after decoding
        remaining: usize,
    },

    /// Binary decoding failed
    #[error("decoding failed: {0}")]
    Decode(#[from] prost::DecodeError),
}

impl ProofOpError {
    pub(crate) fn root_computation(reason: impl Into<String>) -> Self {
        Self::RootComputationFailed {
            reason: reason.into(),
        }
    }
}
