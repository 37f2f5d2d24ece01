//! The range proof operator (`iavl:r`).
//!
//! A [`RangeProof`] is a contiguous run of leaves of a simple Merkle tree over
//! sorted key/value pairs, together with the subtree hashes needed to rebuild
//! the root. Completeness of the interval is witnessed by the neighbouring
//! leaves: the leaf right before `start_key` and the first leaf at or past
//! `end_key` are included whenever they exist.
//!
//! [`RangeOp::run`] recomputes the root, checks the proof against the request,
//! and then checks every claimed pair against the recomputed root.

use ibc_solo_machine_utils::ensure;
use prost::Message;

use crate::{
    error::ProofOpError,
    merkle::{self, Hash},
    proof_op::{decode_exact, ProofOp, ProofOperator},
};

/// Type tag of the range operator.
pub const RANGE_OP_TYPE: &str = "iavl:r";

/// A range query: every key in `[start_key, end_key)`, at most `limit` of them.
///
/// An empty `end_key` leaves the interval unbounded above and a zero `limit`
/// means no limit.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct RangeReq {
    /// Inclusive lower bound
    #[prost(bytes = "vec", tag = "1")]
    pub start_key: Vec<u8>,
    /// Exclusive upper bound
    #[prost(bytes = "vec", tag = "2")]
    pub end_key: Vec<u8>,
    /// Maximum number of returned pairs
    #[prost(uint64, tag = "3")]
    pub limit: u64,
}

impl RangeReq {
    /// Creates a new request.
    #[must_use]
    pub fn new(start_key: impl Into<Vec<u8>>, end_key: impl Into<Vec<u8>>, limit: u64) -> Self {
        Self {
            start_key: start_key.into(),
            end_key: end_key.into(),
            limit,
        }
    }

    fn below_end(&self, key: &[u8]) -> bool {
        self.end_key.is_empty() || key < self.end_key.as_slice()
    }
}

/// The pairs returned for a [`RangeReq`], in key order.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct RangeRes {
    /// Keys in ascending order
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub keys: Vec<Vec<u8>>,
    /// Values, one per key
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub values: Vec<Vec<u8>>,
}

/// A leaf as carried inside a [`RangeProof`].
#[derive(Clone, PartialEq, Eq, Message)]
pub struct ProofLeafNode {
    /// Leaf key
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
    /// SHA-256 of the leaf value
    #[prost(bytes = "vec", tag = "2")]
    pub value_hash: Vec<u8>,
}

/// Inner range membership proof.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct RangeProof {
    /// Number of leaves in the whole tree
    #[prost(uint64, tag = "1")]
    pub total: u64,
    /// Tree position of `leaves[0]`
    #[prost(uint64, tag = "2")]
    pub offset: u64,
    /// Contiguous leaves, boundary witnesses included
    #[prost(message, repeated, tag = "3")]
    pub leaves: Vec<ProofLeafNode>,
    /// Hashes of the subtrees disjoint from `leaves`, left to right
    #[prost(bytes = "vec", repeated, tag = "4")]
    pub aunts: Vec<Vec<u8>>,
}

impl RangeProof {
    /// Answers `request` over sorted key/value pairs and builds the proof for
    /// the answer.
    ///
    /// # Errors
    /// Returns [`ProofOpError::RootComputationFailed`] if `items` are not in
    /// strictly ascending key order.
    pub fn generate(
        items: &[(Vec<u8>, Vec<u8>)],
        request: &RangeReq,
    ) -> Result<(RangeRes, Self), ProofOpError> {
        ensure!(
            items.windows(2).all(|w| w[0].0 < w[1].0),
            ProofOpError::root_computation("items must be sorted by key without duplicates")
        );

        let first = items.partition_point(|(k, _)| k.as_slice() < request.start_key.as_slice());
        let mut last = first;
        while last < items.len()
            && request.below_end(&items[last].0)
            && (request.limit == 0 || ((last - first) as u64) < request.limit)
        {
            last += 1;
        }

        let lo = first.saturating_sub(1);
        let hi = if last < items.len() && !request.below_end(&items[last].0) {
            last + 1
        } else {
            last
        };

        let leaves = merkle::kv_leaves(items);
        let mut aunts = Vec::new();
        if !leaves.is_empty() {
            collect_range_aunts(&leaves, 0, lo, hi, &mut aunts);
        }

        let response = RangeRes {
            keys: items[first..last].iter().map(|(k, _)| k.clone()).collect(),
            values: items[first..last].iter().map(|(_, v)| v.clone()).collect(),
        };
        let proof = Self {
            total: items.len() as u64,
            offset: lo as u64,
            leaves: items[lo..hi]
                .iter()
                .map(|(k, v)| ProofLeafNode {
                    key: k.clone(),
                    value_hash: merkle::value_hash(v).to_vec(),
                })
                .collect(),
            aunts: aunts.iter().map(|a| a.to_vec()).collect(),
        };

        Ok((response, proof))
    }

    /// Rebuilds the root of the tree from the proven leaves and the aunts.
    ///
    /// # Errors
    /// Returns [`ProofOpError::RootComputationFailed`] if the leaves and aunts do
    /// not exactly fill a tree of `total` leaves, or `total` exceeds
    /// [`merkle::MAX_TREE_SIZE`].
    pub fn compute_root(&self) -> Result<Hash, ProofOpError> {
        merkle::ensure_tree_size(self.total)?;
        let end = self
            .offset
            .checked_add(self.leaves.len() as u64)
            .filter(|end| *end <= self.total)
            .ok_or_else(|| {
                ProofOpError::root_computation(format!(
                    "leaves [{}, +{}) exceed tree of {} leaves",
                    self.offset,
                    self.leaves.len(),
                    self.total
                ))
            })?;

        if self.total == 0 {
            ensure!(
                self.aunts.is_empty(),
                ProofOpError::root_computation("empty tree cannot have aunts")
            );
            return Ok(merkle::empty_hash());
        }
        ensure!(
            !self.leaves.is_empty(),
            ProofOpError::root_computation("proof of a non-empty tree carries no leaves")
        );

        let mut aunts = self.aunts.iter();
        let root = self.subtree_root(0, self.total, end, &mut aunts)?;
        ensure!(
            aunts.next().is_none(),
            ProofOpError::root_computation("proof carries unused aunts")
        );
        Ok(root)
    }

    fn subtree_root<'a>(
        &self,
        start: u64,
        size: u64,
        leaves_end: u64,
        aunts: &mut impl Iterator<Item = &'a Vec<u8>>,
    ) -> Result<Hash, ProofOpError> {
        if start + size <= self.offset || start >= leaves_end {
            let aunt = aunts
                .next()
                .ok_or_else(|| ProofOpError::root_computation("proof is missing aunts"))?;
            return merkle::to_hash(aunt, "aunt");
        }
        if size == 1 {
            #[allow(clippy::cast_possible_truncation)]
            let leaf = &self.leaves[(start - self.offset) as usize];
            ensure!(
                leaf.value_hash.len() == merkle::HASH_SIZE,
                ProofOpError::root_computation(format!(
                    "value hash of leaf {start} must be {} bytes",
                    merkle::HASH_SIZE
                ))
            );
            return Ok(merkle::kv_leaf_hash_prehashed(&leaf.key, &leaf.value_hash));
        }

        let k = merkle::split_point(size).ok_or_else(|| {
            ProofOpError::root_computation(format!("subtree of {size} leaves cannot be split"))
        })?;
        let left = self.subtree_root(start, k, leaves_end, aunts)?;
        let right = self.subtree_root(start + k, size - k, leaves_end, aunts)?;
        Ok(merkle::inner_hash(&left, &right))
    }

    /// Checks the proof against `root` and `request`, returning the leaves that
    /// fall inside the requested interval.
    ///
    /// The proof must rebuild `root`, its keys must be strictly ascending, and it
    /// must witness both ends of the interval: a leaf below `start_key` unless it
    /// starts at the first leaf, and a leaf at or past `end_key` unless it ends
    /// at the last leaf or the limit was reached.
    ///
    /// # Errors
    /// Returns [`ProofOpError::RootComputationFailed`] on any inconsistency.
    pub fn verify(
        &self,
        request: &RangeReq,
        root: &Hash,
    ) -> Result<&[ProofLeafNode], ProofOpError> {
        let computed = self.compute_root()?;
        ensure!(
            &computed == root,
            ProofOpError::root_computation(format!(
                "proof rebuilds root {} but {} was expected",
                hex::encode(computed),
                hex::encode(root)
            ))
        );
        self.members(request)
    }

    fn members(&self, request: &RangeReq) -> Result<&[ProofLeafNode], ProofOpError> {
        ensure!(
            self.leaves.windows(2).all(|w| w[0].key < w[1].key),
            ProofOpError::root_computation("proof leaves are not in ascending key order")
        );

        let mut lo = 0;
        let mut hi = self.leaves.len();

        match self.leaves.first() {
            Some(first) if first.key < request.start_key => lo = 1,
            _ => ensure!(
                self.offset == 0,
                ProofOpError::root_computation("missing left boundary witness")
            ),
        }

        let has_right_witness = hi > lo && !request.below_end(&self.leaves[hi - 1].key);
        if has_right_witness {
            hi -= 1;
        }

        let members = &self.leaves[lo..hi];
        if let Some(first) = members.first() {
            ensure!(
                first.key >= request.start_key,
                ProofOpError::root_computation("more than one leaf below the start key")
            );
        }
        if let Some(last) = members.last() {
            ensure!(
                request.below_end(&last.key),
                ProofOpError::root_computation("more than one leaf past the end key")
            );
        }

        let member_count = members.len() as u64;
        let limit_reached = request.limit > 0 && member_count == request.limit;
        ensure!(
            request.limit == 0 || member_count <= request.limit,
            ProofOpError::root_computation(format!(
                "proof holds {member_count} items but the limit is {}",
                request.limit
            ))
        );

        let leaves_end = self.offset + self.leaves.len() as u64;
        ensure!(
            leaves_end == self.total || has_right_witness || limit_reached,
            ProofOpError::root_computation("missing right boundary witness")
        );

        Ok(members)
    }

    /// Checks that `key` is proven with `value` among `members`.
    fn verify_item(members: &[ProofLeafNode], key: &[u8], value: &[u8]) -> Result<(), String> {
        let index = members
            .binary_search_by(|leaf| leaf.key.as_slice().cmp(key))
            .map_err(|_| format!("key {} is not in the proven range", hex::encode(key)))?;

        let expected = merkle::value_hash(value);
        if members[index].value_hash.as_slice() == expected.as_slice() {
            Ok(())
        } else {
            Err(format!(
                "value of key {} does not match the proven value hash",
                hex::encode(key)
            ))
        }
    }
}

fn collect_range_aunts(
    leaves: &[Vec<u8>],
    start: usize,
    lo: usize,
    hi: usize,
    aunts: &mut Vec<Hash>,
) {
    let end = start + leaves.len();
    if end <= lo || start >= hi {
        aunts.push(merkle::root_of(leaves));
        return;
    }
    if leaves.len() == 1 {
        return;
    }
    let k = merkle::split_index(leaves.len());
    collect_range_aunts(&leaves[..k], start, lo, hi, aunts);
    collect_range_aunts(&leaves[k..], start + k, lo, hi, aunts);
}

/// Proves that the claimed [`RangeRes`] is what the tree holds for the request
/// encoded in the operator key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeOp {
    key: Vec<u8>,
    request: RangeReq,
    /// Inner tree proof
    pub proof: RangeProof,
}

impl RangeOp {
    /// Creates the operator for `request`, keyed by the request's encoding.
    #[must_use]
    pub fn new(request: RangeReq, proof: RangeProof) -> Self {
        Self {
            key: request.encode_to_vec(),
            request,
            proof,
        }
    }

    /// The request this operator answers.
    #[must_use]
    pub const fn request(&self) -> &RangeReq {
        &self.request
    }

    /// Decodes the operator from its wire envelope.
    ///
    /// # Errors
    /// Returns [`ProofOpError::UnknownOperatorType`] if the tag is not
    /// [`RANGE_OP_TYPE`], [`ProofOpError::TrailingBytes`] if `data` continues
    /// past the proof, or a decoding error.
    pub fn decode(op: &ProofOp) -> Result<Self, ProofOpError> {
        ensure!(
            op.r#type == RANGE_OP_TYPE,
            ProofOpError::UnknownOperatorType {
                expected: RANGE_OP_TYPE.to_string(),
                actual: op.r#type.clone(),
            }
        );
        let request = RangeReq::decode(op.key.as_slice())?;
        let proof = decode_exact::<RangeProof>(op)?;

        Ok(Self {
            key: op.key.clone(),
            request,
            proof,
        })
    }
}

impl ProofOperator for RangeOp {
    /// Takes a single argument, the encoded [`RangeRes`], and returns the
    /// recomputed root.
    fn run(&self, args: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, ProofOpError> {
        let [claim]: [Vec<u8>; 1] =
            args.try_into()
                .map_err(|args: Vec<Vec<u8>>| ProofOpError::InvalidArgs {
                    expected: 1,
                    actual: args.len(),
                })?;

        let root = self.proof.compute_root()?;
        let members = self.proof.members(&self.request)?;

        let claim = RangeRes::decode(claim.as_slice())?;
        ensure!(
            claim.keys.len() == claim.values.len(),
            ProofOpError::MalformedClaim {
                keys: claim.keys.len(),
                values: claim.values.len(),
            }
        );

        for (index, (key, value)) in claim.keys.iter().zip(&claim.values).enumerate() {
            RangeProof::verify_item(members, key, value)
                .map_err(|reason| ProofOpError::ItemVerificationFailed { index, reason })?;
        }

        tracing::debug!(
            items = claim.keys.len(),
            root = %hex::encode(root),
            "verified range claim"
        );

        Ok(vec![root.to_vec()])
    }

    fn key(&self) -> &[u8] {
        &self.key
    }

    fn proof_op(&self) -> ProofOp {
        ProofOp {
            r#type: RANGE_OP_TYPE.to_string(),
            key: self.key.clone(),
            data: self.proof.encode_length_delimited_to_vec(),
        }
    }
}
