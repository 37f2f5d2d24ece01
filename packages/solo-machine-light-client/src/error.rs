//! This module defines [`SoloMachineError`] and [`StoreError`].

use crate::{crypto::SignatureError, sign_bytes::DataType};

/// Errors returned by the solo machine light client.
#[derive(thiserror::Error, Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SoloMachineError {
    /// The proof targets a sequence the client has not reached
    #[error("client {client_id} is at sequence {latest} but the proof is for sequence {requested}")]
    InvalidHeight {
        /// Client identifier
        client_id: String,
        /// Current sequence of the client
        latest: u64,
        /// Sequence requested by the caller
        requested: u64,
    },

    /// The client is frozen and rejects every verification
    #[error("client {client_id} is frozen")]
    ClientFrozen {
        /// Client identifier
        client_id: String,
    },

    /// Missing or unusable commitment prefix
    #[error("invalid commitment prefix: {reason}")]
    InvalidPrefix {
        /// Reason for error
        reason: String,
    },

    /// Empty, oversized, malformed or stale proof
    #[error("invalid proof: {reason}")]
    InvalidProof {
        /// Reason for error
        reason: String,
    },

    /// Missing consensus state or one of another client type
    #[error("invalid consensus state: {reason}")]
    InvalidConsensusState {
        /// Reason for error
        reason: String,
    },

    /// The signature does not cover the claimed state
    #[error("{kind} verification failed: {source}")]
    VerificationFailed {
        /// What was being verified
        kind: DataType,
        /// Underlying signature error
        #[source]
        source: SignatureError,
    },

    /// Client state failed validation
    #[error("invalid client state: {reason}")]
    InvalidClientState {
        /// Reason for error
        reason: String,
    },

    /// Identifier does not follow the host identifier rules
    #[error("invalid identifier {id:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected identifier
        id: String,
        /// Reason for error
        reason: String,
    },

    /// Public key bytes could not be parsed
    #[error("invalid public key: {reason}")]
    InvalidPublicKey {
        /// Reason for error
        reason: String,
    },

    /// Persistence failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SoloMachineError {
    pub(crate) fn invalid_proof(reason: impl Into<String>) -> Self {
        Self::InvalidProof {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_prefix(reason: impl Into<String>) -> Self {
        Self::InvalidPrefix {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_consensus_state(reason: impl Into<String>) -> Self {
        Self::InvalidConsensusState {
            reason: reason.into(),
        }
    }
}

/// Errors raised by [`crate::ClientStore`].
#[derive(thiserror::Error, Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum StoreError {
    /// No client state is stored under the identifier
    #[error("client {client_id} not found")]
    ClientNotFound {
        /// Client identifier
        client_id: String,
    },

    /// A client state is already stored under the identifier
    #[error("client {client_id} already exists")]
    ClientExists {
        /// Client identifier
        client_id: String,
    },

    /// Client state could not be encoded or decoded
    #[error("client state encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A thread panicked while holding the client lock
    #[error("lock for client {client_id} is poisoned")]
    LockPoisoned {
        /// Client identifier
        client_id: String,
    },
}
