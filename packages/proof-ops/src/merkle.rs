//! Simple Merkle tree hashing in the `CometBFT` style.
//!
//! Node hashing comes from `tendermint::merkle`: leaves and inner nodes are
//! domain separated by a one byte prefix, and a tree of `n` leaves is split at
//! the largest power of two strictly below `n`. This module adds key/value
//! leaves and single leaf inclusion proofs on top.

use ibc_solo_machine_utils::ensure;
use prost::Message;
use sha2::{Digest, Sha256};
use tendermint::merkle::{simple_hash_from_byte_vectors, MerkleHash};

use crate::error::ProofOpError;

pub use tendermint::merkle::{Hash, HASH_SIZE};

/// Largest tree a proof may claim, the biggest power of two a `u64` holds.
pub const MAX_TREE_SIZE: u64 = 1 << 63;

/// Hash of the empty tree.
#[must_use]
pub fn empty_hash() -> Hash {
    Sha256::default().empty_hash()
}

/// Plain SHA-256 of `value`, the form in which values are committed to leaves.
#[must_use]
pub fn value_hash(value: &[u8]) -> Hash {
    Sha256::digest(value).into()
}

/// Hash of a leaf holding `bytes`.
#[must_use]
pub fn leaf_hash(bytes: &[u8]) -> Hash {
    Sha256::default().leaf_hash(bytes)
}

/// Hash of an inner node with the given children.
#[must_use]
pub fn inner_hash(left: &Hash, right: &Hash) -> Hash {
    Sha256::default().inner_hash(*left, *right)
}

/// Hash of a key/value leaf.
#[must_use]
pub fn kv_leaf_hash(key: &[u8], value: &[u8]) -> Hash {
    leaf_hash(&kv_leaf_bytes(key, &value_hash(value)))
}

/// Hash of a key/value leaf whose value has already been hashed with [`value_hash`].
#[must_use]
pub fn kv_leaf_hash_prehashed(key: &[u8], value_hash: &[u8]) -> Hash {
    leaf_hash(&kv_leaf_bytes(key, value_hash))
}

/// Leaf preimage: the key and the value hash, each behind a uvarint length.
pub(crate) fn kv_leaf_bytes(key: &[u8], value_hash: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(key.len() + value_hash.len() + 20);
    encode_byte_slice(key, &mut buf);
    encode_byte_slice(value_hash, &mut buf);
    buf
}

fn encode_byte_slice(bytes: &[u8], buf: &mut Vec<u8>) {
    prost::encoding::encode_varint(bytes.len() as u64, buf);
    buf.extend_from_slice(bytes);
}

pub(crate) fn kv_leaves(items: &[(Vec<u8>, Vec<u8>)]) -> Vec<Vec<u8>> {
    items
        .iter()
        .map(|(k, v)| kv_leaf_bytes(k, &value_hash(v)))
        .collect()
}

/// Root of the tree over already encoded leaves.
pub(crate) fn root_of(leaves: &[Vec<u8>]) -> Hash {
    simple_hash_from_byte_vectors::<Sha256>(leaves)
}

/// Number of leaves in the left subtree of a tree with `size` leaves.
///
/// `size` must be at least 2. Returns `None` for trees larger than
/// [`MAX_TREE_SIZE`].
#[must_use]
pub const fn split_point(size: u64) -> Option<u64> {
    match size.checked_next_power_of_two() {
        Some(pow) => Some(pow / 2),
        None => None,
    }
}

/// Root of the tree built over sorted key/value pairs.
#[must_use]
pub fn kv_root(items: &[(Vec<u8>, Vec<u8>)]) -> Hash {
    root_of(&kv_leaves(items))
}

/// Split point for in-memory slices, which never exceed [`MAX_TREE_SIZE`].
pub(crate) const fn split_index(size: usize) -> usize {
    size.next_power_of_two() / 2
}

pub(crate) fn to_hash(bytes: &[u8], what: &str) -> Result<Hash, ProofOpError> {
    bytes.try_into().map_err(|_| {
        ProofOpError::root_computation(format!(
            "{what} must be {HASH_SIZE} bytes, found {}",
            bytes.len()
        ))
    })
}

pub(crate) fn ensure_tree_size(total: u64) -> Result<(), ProofOpError> {
    ensure!(
        total <= MAX_TREE_SIZE,
        ProofOpError::root_computation(format!(
            "tree of {total} leaves exceeds the maximum of {MAX_TREE_SIZE}"
        ))
    );
    Ok(())
}

/// Inclusion proof of a single leaf in a simple Merkle tree.
///
/// `aunts` are ordered from the leaf's sibling up to the root's child.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct SimpleProof {
    /// Number of leaves in the tree
    #[prost(uint64, tag = "1")]
    pub total: u64,
    /// Position of the proven leaf
    #[prost(uint64, tag = "2")]
    pub index: u64,
    /// Hash of the proven leaf
    #[prost(bytes = "vec", tag = "3")]
    pub leaf_hash: Vec<u8>,
    /// Sibling hashes along the path to the root
    #[prost(bytes = "vec", repeated, tag = "4")]
    pub aunts: Vec<Vec<u8>>,
}

impl SimpleProof {
    /// Builds the proof for `items[index]` over sorted key/value pairs.
    ///
    /// Returns `None` if `index` is out of range.
    #[must_use]
    pub fn from_items(items: &[(Vec<u8>, Vec<u8>)], index: usize) -> Option<Self> {
        let leaves = kv_leaves(items);
        let leaf = leaf_hash(leaves.get(index)?);

        let mut aunts = Vec::new();
        collect_aunts(&leaves, index, &mut aunts);

        Some(Self {
            total: leaves.len() as u64,
            index: index as u64,
            leaf_hash: leaf.to_vec(),
            aunts: aunts.iter().map(|a| a.to_vec()).collect(),
        })
    }

    /// Recomputes the root committed to by this proof.
    ///
    /// # Errors
    /// Returns [`ProofOpError::RootComputationFailed`] if the proof shape does not
    /// match `total` and `index`, or `total` exceeds [`MAX_TREE_SIZE`].
    pub fn compute_root(&self) -> Result<Hash, ProofOpError> {
        ensure!(
            self.total > 0,
            ProofOpError::root_computation("proof of an empty tree")
        );
        ensure_tree_size(self.total)?;
        ensure!(
            self.index < self.total,
            ProofOpError::root_computation(format!(
                "leaf index {} out of range for {} leaves",
                self.index, self.total
            ))
        );

        let leaf = to_hash(&self.leaf_hash, "leaf hash")?;
        let aunts = self
            .aunts
            .iter()
            .map(|a| to_hash(a, "aunt"))
            .collect::<Result<Vec<_>, _>>()?;

        hash_from_aunts(self.index, self.total, leaf, &aunts).ok_or_else(|| {
            ProofOpError::root_computation(format!(
                "{} aunts do not fit a tree of {} leaves",
                aunts.len(),
                self.total
            ))
        })
    }
}

fn collect_aunts(leaves: &[Vec<u8>], index: usize, aunts: &mut Vec<Hash>) {
    if leaves.len() <= 1 {
        return;
    }
    let k = split_index(leaves.len());
    if index < k {
        collect_aunts(&leaves[..k], index, aunts);
        aunts.push(root_of(&leaves[k..]));
    } else {
        collect_aunts(&leaves[k..], index - k, aunts);
        aunts.push(root_of(&leaves[..k]));
    }
}

fn hash_from_aunts(index: u64, total: u64, leaf: Hash, aunts: &[Hash]) -> Option<Hash> {
    if total == 1 {
        return aunts.is_empty().then_some(leaf);
    }
    let (last, rest) = aunts.split_last()?;
    let num_left = split_point(total)?;
    if index < num_left {
        let left = hash_from_aunts(index, num_left, leaf, rest)?;
        Some(inner_hash(&left, last))
    } else {
        let right = hash_from_aunts(index - num_left, total - num_left, leaf, rest)?;
        Some(inner_hash(last, &right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: u8) -> Vec<(Vec<u8>, Vec<u8>)> {
        (0..n).map(|i| (vec![b'k', i], vec![b'v', i])).collect()
    }

    #[rstest::rstest]
    #[case(2, Some(1))]
    #[case(3, Some(2))]
    #[case(4, Some(2))]
    #[case(5, Some(4))]
    #[case(8, Some(4))]
    #[case(9, Some(8))]
    #[case(MAX_TREE_SIZE, Some(1 << 62))]
    #[case(MAX_TREE_SIZE + 1, None)]
    #[case(u64::MAX, None)]
    fn splits_at_largest_power_of_two_below_size(
        #[case] size: u64,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(split_point(size), expected);
    }

    #[test]
    fn kv_root_matches_manual_fold() {
        let items = items(3);
        let leaves: Vec<Hash> = items.iter().map(|(k, v)| kv_leaf_hash(k, v)).collect();
        let expected = inner_hash(&inner_hash(&leaves[0], &leaves[1]), &leaves[2]);
        assert_eq!(kv_root(&items), expected);
    }

    #[test]
    fn single_leaf_tree_root_is_the_leaf() {
        let items = items(1);
        assert_eq!(kv_root(&items), kv_leaf_hash(&items[0].0, &items[0].1));
    }

    #[test]
    fn empty_tree_root_is_hash_of_nothing() {
        assert_eq!(kv_root(&[]), empty_hash());
    }

    #[test]
    fn leaf_and_inner_hashes_are_domain_separated() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let mut concat = a.to_vec();
        concat.extend_from_slice(&b);
        assert_ne!(leaf_hash(&concat), inner_hash(&a, &b));
    }

    #[test]
    fn simple_proofs_recompute_the_root_for_every_leaf() {
        for n in 1..=9 {
            let items = items(n);
            let root = kv_root(&items);
            for index in 0..items.len() {
                let proof = SimpleProof::from_items(&items, index).unwrap();
                assert_eq!(proof.compute_root().unwrap(), root, "n={n} index={index}");
            }
        }
    }

    #[test]
    fn simple_proof_with_extra_aunt_fails() {
        let items = items(4);
        let mut proof = SimpleProof::from_items(&items, 1).unwrap();
        proof.aunts.push(vec![0; 32]);
        assert!(matches!(
            proof.compute_root(),
            Err(ProofOpError::RootComputationFailed { reason }) if reason.contains("aunts")
        ));
    }

    #[test]
    fn simple_proof_with_out_of_range_index_fails() {
        let items = items(4);
        let mut proof = SimpleProof::from_items(&items, 3).unwrap();
        proof.index = 4;
        assert!(matches!(
            proof.compute_root(),
            Err(ProofOpError::RootComputationFailed { reason }) if reason.contains("out of range")
        ));
    }

    #[rstest::rstest]
    #[case::max_total(u64::MAX, 0)]
    #[case::last_index(u64::MAX, u64::MAX - 1)]
    #[case::just_past_limit(MAX_TREE_SIZE + 1, 0)]
    fn simple_proof_of_oversized_tree_fails(#[case] total: u64, #[case] index: u64) {
        let proof = SimpleProof {
            total,
            index,
            leaf_hash: vec![0; HASH_SIZE],
            aunts: vec![vec![0; HASH_SIZE]; 64],
        };
        assert!(matches!(
            proof.compute_root(),
            Err(ProofOpError::RootComputationFailed { reason }) if reason.contains("exceeds")
        ));
    }

    #[test]
    fn simple_proof_of_largest_tree_runs_out_of_aunts() {
        let proof = SimpleProof {
            total: MAX_TREE_SIZE,
            index: MAX_TREE_SIZE - 1,
            leaf_hash: vec![0; HASH_SIZE],
            aunts: vec![],
        };
        assert!(matches!(
            proof.compute_root(),
            Err(ProofOpError::RootComputationFailed { reason }) if reason.contains("aunts")
        ));
    }

    #[test]
    fn from_items_rejects_missing_index() {
        assert!(SimpleProof::from_items(&items(2), 2).is_none());
    }
}
