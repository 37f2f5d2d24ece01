//! Commitment prefix and the canonical commitment paths.
//!
//! A prefixed path is kept as two segments, the prefix and the logical path,
//! so `"ib" + "c/x"` and `"ibc" + "/x"` never sign to the same bytes.

use prost::Message;
use serde::{Deserialize, Serialize};

use crate::error::SoloMachineError;

/// Key space of the counterparty's commitment store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePrefix {
    /// Prefix bytes
    #[serde(with = "ibc_solo_machine_utils::serde::base64_bytes")]
    pub key_prefix: Vec<u8>,
}

impl MerklePrefix {
    /// Creates a prefix.
    #[must_use]
    pub fn new(key_prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
        }
    }

    /// Whether the prefix has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_prefix.is_empty()
    }

    /// Joins the prefix and `path` into a [`MerklePath`].
    ///
    /// # Errors
    /// Returns [`SoloMachineError::InvalidPrefix`] if the prefix or the path is empty.
    pub fn apply(&self, path: impl Into<String>) -> Result<MerklePath, SoloMachineError> {
        let path = path.into();
        if self.is_empty() {
            return Err(SoloMachineError::invalid_prefix("prefix cannot be empty"));
        }
        if path.is_empty() {
            return Err(SoloMachineError::invalid_prefix(
                "cannot apply a prefix to an empty path",
            ));
        }
        Ok(MerklePath {
            key_path: vec![self.key_prefix.clone(), path.into_bytes()],
        })
    }
}

/// Path segments from the store root down to a key.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct MerklePath {
    /// Segments, outermost first
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub key_path: Vec<Vec<u8>>,
}

/// `clients/{client_id}/consensusStates/{height}`
#[must_use]
pub fn consensus_state_path(client_id: &str, height: u64) -> String {
    format!("clients/{client_id}/consensusStates/{height}")
}

/// `connections/{connection_id}`
#[must_use]
pub fn connection_path(connection_id: &str) -> String {
    format!("connections/{connection_id}")
}

/// `channels/{port_id}/{channel_id}`
#[must_use]
pub fn channel_path(port_id: &str, channel_id: &str) -> String {
    format!("channels/{port_id}/{channel_id}")
}

/// `commitments/ports/{port_id}/channels/{channel_id}/sequences/{sequence}`
#[must_use]
pub fn packet_commitment_path(port_id: &str, channel_id: &str, sequence: u64) -> String {
    format!("commitments/ports/{port_id}/channels/{channel_id}/sequences/{sequence}")
}

/// `acks/ports/{port_id}/channels/{channel_id}/sequences/{sequence}`
#[must_use]
pub fn packet_acknowledgement_path(port_id: &str, channel_id: &str, sequence: u64) -> String {
    format!("acks/ports/{port_id}/channels/{channel_id}/sequences/{sequence}")
}

/// `nextSequenceRecv/ports/{port_id}/channels/{channel_id}`
#[must_use]
pub fn next_sequence_recv_path(port_id: &str, channel_id: &str) -> String {
    format!("nextSequenceRecv/ports/{port_id}/channels/{channel_id}")
}
