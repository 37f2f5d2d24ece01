//! The proof operator wire envelope, the [`ProofOperator`] capability and the
//! chain runner.
//!
//! The runner only threads outputs into inputs. It never decides whether the
//! final output is trusted; callers compare it against whatever root they trust
//! (an app hash, a store root, ...).

use std::collections::BTreeMap;
use std::fmt::Debug;

use ibc_solo_machine_utils::ensure;
use prost::Message;

use crate::{error::ProofOpError, range::RangeOp, value::ValueOp};

/// Wire envelope of a single proof operator, and the ordered list of them
/// shipped in a query response.
///
/// `type` selects the decoder, `data` is the length prefixed encoding of the
/// operator's fields.
pub use tendermint_proto::crypto::{ProofOp, ProofOps};

/// Decodes the length prefixed operator fields in `op.data`, which must hold
/// exactly one message.
///
/// # Errors
/// Returns a decoding error, or [`ProofOpError::TrailingBytes`] if bytes remain.
pub fn decode_exact<T: Message + Default>(op: &ProofOp) -> Result<T, ProofOpError> {
    let mut buf = op.data.as_slice();
    let message = T::decode_length_delimited(&mut buf)?;
    ensure!(
        buf.is_empty(),
        ProofOpError::TrailingBytes {
            op_type: op.r#type.clone(),
            remaining: buf.len(),
        }
    );
    Ok(message)
}

/// One step of a proof chain.
pub trait ProofOperator: Debug + Send + Sync {
    /// Consumes the previous step's output and produces the next input.
    ///
    /// # Errors
    /// Returns an error if the step cannot be proven.
    fn run(&self, args: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ProofOpError>;

    /// The key this operator is associated with.
    fn key(&self) -> &[u8];

    /// Encodes the operator into its wire envelope.
    fn proof_op(&self) -> ProofOp;
}

/// A runnable chain of proof operators.
#[derive(Debug, Default)]
pub struct ProofOperators(Vec<Box<dyn ProofOperator>>);

impl ProofOperators {
    /// Creates a chain from operators in execution order.
    #[must_use]
    pub fn new(ops: Vec<Box<dyn ProofOperator>>) -> Self {
        Self(ops)
    }

    /// Number of operators in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain has no operators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Executes every operator in order, feeding each one the previous output,
    /// and returns the last output. An empty chain returns `args` unchanged.
    ///
    /// # Errors
    /// Propagates the first operator error.
    #[tracing::instrument(skip_all, fields(steps = self.0.len()))]
    pub fn run(&self, args: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ProofOpError> {
        self.0
            .iter()
            .enumerate()
            .try_fold(args, |args, (step, op)| {
                op.run(args).inspect_err(|err| {
                    let key = hex::encode(op.key());
                    tracing::debug!(step, key, %err, "proof operator failed");
                })
            })
    }

    /// Encodes the chain into its wire form.
    #[must_use]
    pub fn to_proof_ops(&self) -> ProofOps {
        ProofOps {
            ops: self.0.iter().map(|op| op.proof_op()).collect(),
        }
    }
}

/// Decodes one envelope into a runnable operator.
pub type OpDecoder = fn(&ProofOp) -> Result<Box<dyn ProofOperator>, ProofOpError>;

/// Registry of operator decoders keyed by type tag.
#[derive(Clone)]
pub struct ProofRuntime {
    decoders: BTreeMap<String, OpDecoder>,
}

impl Debug for ProofRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofRuntime")
            .field("types", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProofRuntime {
    /// A runtime with no decoders registered.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    /// Registers `decoder` for the `op_type` tag.
    ///
    /// # Errors
    /// Returns [`ProofOpError::DuplicateOperatorType`] if the tag is taken.
    pub fn register(
        &mut self,
        op_type: impl Into<String>,
        decoder: OpDecoder,
    ) -> Result<(), ProofOpError> {
        let op_type = op_type.into();
        if self.decoders.contains_key(&op_type) {
            return Err(ProofOpError::DuplicateOperatorType(op_type));
        }
        self.decoders.insert(op_type, decoder);
        Ok(())
    }

    /// Decodes a single envelope.
    ///
    /// # Errors
    /// Returns [`ProofOpError::UnknownOperatorType`] for an unregistered tag, or
    /// the decoder's error.
    pub fn decode(&self, op: &ProofOp) -> Result<Box<dyn ProofOperator>, ProofOpError> {
        let decoder =
            self.decoders
                .get(&op.r#type)
                .ok_or_else(|| ProofOpError::UnknownOperatorType {
                    expected: self
                        .decoders
                        .keys()
                        .map(String::as_str)
                        .collect::<Vec<_>>()
                        .join(" | "),
                    actual: op.r#type.clone(),
                })?;
        decoder(op)
    }

    /// Decodes a full chain.
    ///
    /// # Errors
    /// Returns the first decoding error.
    pub fn decode_proof(&self, proof: &ProofOps) -> Result<ProofOperators, ProofOpError> {
        proof
            .ops
            .iter()
            .map(|op| self.decode(op))
            .collect::<Result<Vec<_>, _>>()
            .map(ProofOperators)
    }
}

impl Default for ProofRuntime {
    /// A runtime with the range and simple value operators registered.
    fn default() -> Self {
        let mut decoders: BTreeMap<String, OpDecoder> = BTreeMap::new();
        decoders.insert(crate::range::RANGE_OP_TYPE.to_string(), decode_range_op);
        decoders.insert(crate::value::VALUE_OP_TYPE.to_string(), decode_value_op);
        Self { decoders }
    }
}

fn decode_range_op(op: &ProofOp) -> Result<Box<dyn ProofOperator>, ProofOpError> {
    Ok(Box::new(RangeOp::decode(op)?))
}

fn decode_value_op(op: &ProofOp) -> Result<Box<dyn ProofOperator>, ProofOpError> {
    Ok(Box::new(ValueOp::decode(op)?))
}
