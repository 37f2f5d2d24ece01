//! The simple value operator (`simple:v`).
//!
//! Proves that `key` maps to the input value in a simple Merkle tree and outputs
//! that tree's root. Chained after a [`crate::RangeOp`] it lifts a store root
//! into the root of the multistore holding it.

use ibc_solo_machine_utils::ensure;
use prost::Message;

use crate::{
    error::ProofOpError,
    merkle::{self, SimpleProof},
    proof_op::{decode_exact, ProofOp, ProofOperator},
};

/// Type tag of the simple value operator.
pub const VALUE_OP_TYPE: &str = "simple:v";

/// Single key/value inclusion step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueOp {
    key: Vec<u8>,
    /// Inclusion proof of the key/value leaf
    pub proof: SimpleProof,
}

impl ValueOp {
    /// Creates the operator for `key` with its inclusion proof.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>, proof: SimpleProof) -> Self {
        Self {
            key: key.into(),
            proof,
        }
    }

    /// Builds the operator proving `key` within sorted key/value pairs.
    ///
    /// Returns `None` if `key` is absent.
    #[must_use]
    pub fn from_items(items: &[(Vec<u8>, Vec<u8>)], key: &[u8]) -> Option<Self> {
        let index = items.iter().position(|(k, _)| k.as_slice() == key)?;
        SimpleProof::from_items(items, index).map(|proof| Self::new(key, proof))
    }

    /// Decodes the operator from its wire envelope.
    ///
    /// # Errors
    /// Returns [`ProofOpError::UnknownOperatorType`] if the tag is not
    /// [`VALUE_OP_TYPE`], [`ProofOpError::TrailingBytes`] if `data` continues
    /// past the proof, or a decoding error.
    pub fn decode(op: &ProofOp) -> Result<Self, ProofOpError> {
        ensure!(
            op.r#type == VALUE_OP_TYPE,
            ProofOpError::UnknownOperatorType {
                expected: VALUE_OP_TYPE.to_string(),
                actual: op.r#type.clone(),
            }
        );
        let proof = decode_exact::<SimpleProof>(op)?;
        Ok(Self::new(op.key.clone(), proof))
    }
}

impl ProofOperator for ValueOp {
    fn run(&self, args: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ProofOpError> {
        let [value]: [Vec<u8>; 1] =
            args.try_into()
                .map_err(|args: Vec<Vec<u8>>| ProofOpError::InvalidArgs {
                    expected: 1,
                    actual: args.len(),
                })?;

        let leaf = merkle::kv_leaf_hash(&self.key, &value);
        ensure!(
            leaf.as_slice() == self.proof.leaf_hash.as_slice(),
            ProofOpError::LeafMismatch {
                expected: self.proof.leaf_hash.clone(),
                actual: leaf.to_vec(),
            }
        );

        Ok(vec![self.proof.compute_root()?.to_vec()])
    }

    fn key(&self) -> &[u8] {
        &self.key
    }

    fn proof_op(&self) -> ProofOp {
        ProofOp {
            r#type: VALUE_OP_TYPE.to_string(),
            key: self.key.clone(),
            data: self.proof.encode_length_delimited_to_vec(),
        }
    }
}
