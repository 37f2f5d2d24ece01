//! Fixtures for proof chain tests

use ibc_proof_ops::{
    merkle, ProofOperator, ProofOps, RangeOp, RangeProof, RangeReq, RangeRes, ValueOp,
};

/// Name of the store that range queries run against
pub const IBC_STORE: &[u8] = b"ibc";

/// A two level commitment: an inner store and the multistore holding its root.
pub struct MultiStore {
    pub ibc: Vec<(Vec<u8>, Vec<u8>)>,
    pub stores: Vec<(Vec<u8>, Vec<u8>)>,
}

impl MultiStore {
    /// Builds the fixture with `n` packet commitments in the ibc store.
    pub fn with_commitments(n: u8) -> Self {
        let ibc: Vec<(Vec<u8>, Vec<u8>)> =
            (0..n).map(|i| (commitment_key(i), vec![i; 32])).collect();
        let stores = vec![
            (b"acc".to_vec(), vec![0xaa; 32]),
            (b"bank".to_vec(), vec![0xbb; 32]),
            (IBC_STORE.to_vec(), merkle::kv_root(&ibc).to_vec()),
            (b"staking".to_vec(), vec![0xcc; 32]),
        ];
        Self { ibc, stores }
    }

    pub fn app_hash(&self) -> merkle::Hash {
        merkle::kv_root(&self.stores)
    }

    /// Answers `request` and returns the claim with the wire proof lifting it to
    /// the app hash.
    pub fn query(&self, request: RangeReq) -> (RangeRes, ProofOps) {
        let (response, proof) = RangeProof::generate(&self.ibc, &request).expect("sorted store");
        let range = RangeOp::new(request, proof);
        let value = ValueOp::from_items(&self.stores, IBC_STORE).expect("ibc store exists");

        let ops = ProofOps {
            ops: vec![range.proof_op(), value.proof_op()],
        };
        (response, ops)
    }
}

/// Path of the `i`th packet commitment on `transfer/channel-0`.
pub fn commitment_key(i: u8) -> Vec<u8> {
    format!("commitments/ports/transfer/channels/channel-0/sequences/{i:03}").into_bytes()
}
