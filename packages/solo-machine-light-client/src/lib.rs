#![doc = include_str!("../README.md")]
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

#[cfg(test)]
use ibc_proto as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tracing_subscriber as _;

pub mod client_state;
pub mod consensus_state;
pub mod crypto;
pub mod error;
pub mod guard;
pub mod identifier;
pub mod path;
pub mod proto;
pub mod proof;
pub mod sign_bytes;
pub mod store;
pub mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client_state::{ClientState, SOLO_MACHINE_CLIENT_TYPE};
pub use consensus_state::{AnyConsensusState, ConsensusState, TendermintConsensusState};
pub use crypto::{PublicKey, SignatureError};
pub use error::{SoloMachineError, StoreError};
pub use path::{MerklePath, MerklePrefix};
pub use proof::{ProofCodec, SignedProof};
pub use sign_bytes::DataType;
pub use store::{ClientStore, ClientStoreConfig, KvStore, MemoryStore};
pub use verify::VerifyArgs;
