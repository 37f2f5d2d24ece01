//! Preconditions shared by every verification.

use crate::{
    client_state::ClientState,
    consensus_state::AnyConsensusState,
    error::SoloMachineError,
    path::MerklePrefix,
    proof::{ProofCodec, SignedProof},
};

/// Validates the arguments of a verification and decodes its proof.
///
/// Checks, in order, that the requested sequence has been reached, that the
/// client is not frozen, that a non-empty prefix is given, that the proof is
/// non-empty and decodes, that the consensus state is a solo machine one, and
/// that the signature is not older than the consensus state.
///
/// # Errors
/// Returns the error of the first failing check.
#[tracing::instrument(
    skip_all,
    fields(client_id = %client_state.client_id, requested = sequence)
)]
pub fn check_preconditions(
    codec: &ProofCodec,
    client_state: &ClientState,
    sequence: u64,
    prefix: Option<&MerklePrefix>,
    proof: &[u8],
    consensus_state: Option<&AnyConsensusState>,
) -> Result<SignedProof, SoloMachineError> {
    check(codec, client_state, sequence, prefix, proof, consensus_state)
        .inspect_err(|err| tracing::debug!(%err, "verification precondition failed"))
}

fn check(
    codec: &ProofCodec,
    client_state: &ClientState,
    sequence: u64,
    prefix: Option<&MerklePrefix>,
    proof: &[u8],
    consensus_state: Option<&AnyConsensusState>,
) -> Result<SignedProof, SoloMachineError> {
    let latest = client_state.latest_height();
    if sequence > latest {
        return Err(SoloMachineError::InvalidHeight {
            client_id: client_state.client_id.clone(),
            latest,
            requested: sequence,
        });
    }

    if client_state.is_frozen() {
        return Err(SoloMachineError::ClientFrozen {
            client_id: client_state.client_id.clone(),
        });
    }

    match prefix {
        None => return Err(SoloMachineError::invalid_prefix("prefix cannot be nil")),
        Some(prefix) if prefix.is_empty() => {
            return Err(SoloMachineError::invalid_prefix("prefix cannot be empty"))
        }
        Some(_) => {}
    }

    if proof.is_empty() {
        return Err(SoloMachineError::invalid_proof("proof cannot be empty"));
    }
    let signed = codec.decode_proof(proof)?;

    let consensus_state = match consensus_state {
        Some(AnyConsensusState::SoloMachine(cs)) => cs,
        Some(other) => {
            return Err(SoloMachineError::invalid_consensus_state(format!(
                "expected a {} consensus state, found {}",
                client_state.client_type(),
                other.client_type()
            )))
        }
        None => {
            return Err(SoloMachineError::invalid_consensus_state(
                "consensus state cannot be empty",
            ))
        }
    };

    if signed.timestamp < consensus_state.timestamp {
        return Err(SoloMachineError::invalid_proof(format!(
            "stale signature: timestamp {} is before the consensus state timestamp {}",
            signed.timestamp, consensus_state.timestamp
        )));
    }

    Ok(signed)
}
