//! Consensus states.

use serde::{Deserialize, Serialize};

use crate::{crypto::PublicKey, error::SoloMachineError};

/// The trusted snapshot of a solo machine: its key, sequence and time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusState {
    /// Current signing key of the solo machine
    pub public_key: PublicKey,
    /// Next sequence a signature must cover
    #[serde(with = "ibc_solo_machine_utils::serde::number_as_string")]
    pub sequence: u64,
    /// Latest certified time
    #[serde(with = "ibc_solo_machine_utils::serde::number_as_string")]
    pub timestamp: u64,
}

impl ConsensusState {
    /// Creates a consensus state.
    #[must_use]
    pub const fn new(public_key: PublicKey, sequence: u64, timestamp: u64) -> Self {
        Self {
            public_key,
            sequence,
            timestamp,
        }
    }

    /// Basic validation.
    ///
    /// # Errors
    /// Returns [`SoloMachineError::InvalidConsensusState`] if the timestamp is zero.
    pub fn validate(&self) -> Result<(), SoloMachineError> {
        if self.timestamp == 0 {
            return Err(SoloMachineError::invalid_consensus_state(
                "timestamp cannot be 0",
            ));
        }
        Ok(())
    }
}

/// Consensus state of a tendermint client. Carried only so that a consensus
/// state of the wrong client type can be represented and rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TendermintConsensusState {
    /// Commitment root
    #[serde(with = "ibc_solo_machine_utils::serde::base64_bytes")]
    pub root: Vec<u8>,
    /// Block time in nanoseconds
    #[serde(with = "ibc_solo_machine_utils::serde::number_as_string")]
    pub timestamp: u64,
}

/// Consensus states of the client types known to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "client_type", rename_all = "snake_case")]
pub enum AnyConsensusState {
    /// Solo machine consensus state
    SoloMachine(ConsensusState),
    /// Tendermint consensus state
    Tendermint(TendermintConsensusState),
}

impl AnyConsensusState {
    /// Name of the variant's client type.
    #[must_use]
    pub const fn client_type(&self) -> &'static str {
        match self {
            Self::SoloMachine(_) => crate::client_state::SOLO_MACHINE_CLIENT_TYPE,
            Self::Tendermint(_) => "07-tendermint",
        }
    }
}

impl From<ConsensusState> for AnyConsensusState {
    fn from(consensus_state: ConsensusState) -> Self {
        Self::SoloMachine(consensus_state)
    }
}
