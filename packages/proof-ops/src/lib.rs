#![doc = include_str!("../README.md")]
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

#[cfg(test)]
use rstest as _;

mod error;

pub mod merkle;
pub mod proof_op;
pub mod range;
pub mod value;

pub use error::ProofOpError;
pub use proof_op::{ProofOp, ProofOperator, ProofOperators, ProofOps, ProofRuntime};
pub use range::{RangeOp, RangeProof, RangeReq, RangeRes, RANGE_OP_TYPE};
pub use value::{ValueOp, VALUE_OP_TYPE};
