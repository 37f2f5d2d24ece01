//! Solo machine client state.

use serde::{Deserialize, Serialize};

use crate::{
    consensus_state::ConsensusState, error::SoloMachineError, identifier, proof::SignedProof,
};

/// Client type of the solo machine client.
pub const SOLO_MACHINE_CLIENT_TYPE: &str = "06-solomachine";

/// A solo machine light client.
///
/// The client only ever holds the latest consensus state. Its sequence is the
/// client height and only moves forward through successful verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    /// Client identifier
    pub client_id: String,
    /// Informational label of the counterparty
    pub chain_id: String,
    /// Whether the client rejects all verification
    pub is_frozen: bool,
    /// Latest trusted consensus state
    pub consensus_state: ConsensusState,
}

impl ClientState {
    /// Creates an unfrozen client.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        chain_id: impl Into<String>,
        consensus_state: ConsensusState,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            chain_id: chain_id.into(),
            is_frozen: false,
            consensus_state,
        }
    }

    /// Validates the identifier and the consensus state.
    ///
    /// # Errors
    /// Returns [`SoloMachineError::InvalidIdentifier`] or
    /// [`SoloMachineError::InvalidConsensusState`].
    pub fn validate(&self) -> Result<(), SoloMachineError> {
        identifier::validate_client_identifier(&self.client_id)?;
        self.consensus_state.validate()
    }

    /// Always [`SOLO_MACHINE_CLIENT_TYPE`].
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn client_type(&self) -> &'static str {
        SOLO_MACHINE_CLIENT_TYPE
    }

    /// The client height, which is the consensus sequence.
    #[must_use]
    pub const fn latest_height(&self) -> u64 {
        self.consensus_state.sequence
    }

    /// Whether the client is frozen.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.is_frozen
    }

    /// Counterparty label.
    #[must_use]
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// A frozen copy of this client.
    ///
    /// Only misbehaviour handling outside of verification freezes a client.
    #[must_use]
    pub fn frozen(&self) -> Self {
        Self {
            is_frozen: true,
            ..self.clone()
        }
    }

    /// The state that follows once `proof` has been verified: the sequence
    /// advances by one, the time becomes the signature's and the key rotates if
    /// the proof carries a new one.
    ///
    /// # Errors
    /// Returns [`SoloMachineError::InvalidClientState`] if the sequence would overflow.
    pub fn successor(&self, proof: &SignedProof) -> Result<Self, SoloMachineError> {
        let sequence = self.consensus_state.sequence.checked_add(1).ok_or_else(|| {
            SoloMachineError::InvalidClientState {
                reason: format!("sequence of client {} overflows", self.client_id),
            }
        })?;

        Ok(Self {
            consensus_state: ConsensusState {
                public_key: proof
                    .new_public_key
                    .unwrap_or(self.consensus_state.public_key),
                sequence,
                timestamp: proof.timestamp,
            },
            ..self.clone()
        })
    }
}
