//! Test utilities for the solo machine light client

#[cfg(any(test, feature = "test-utils"))]
pub use fixtures::*;

#[allow(
    missing_docs,
    clippy::missing_panics_doc,
    clippy::too_many_arguments
)]
#[cfg(any(test, feature = "test-utils"))]
mod fixtures {
    use ed25519_dalek::Signer as _;

    use crate::{
        client_state::ClientState,
        consensus_state::ConsensusState,
        crypto::PublicKey,
        path::MerklePath,
        proof::{ProofCodec, SignedProof},
        sign_bytes::DataType,
    };

    pub const CLIENT_ID: &str = "06-solomachine-0";
    pub const CHAIN_ID: &str = "solo-machine";

    /// A solo machine signing key.
    #[derive(Clone, Debug)]
    pub enum TestSigner {
        Ed25519(ed25519_dalek::SigningKey),
        Secp256k1(k256::ecdsa::SigningKey),
    }

    impl TestSigner {
        #[must_use]
        pub fn ed25519(seed: u8) -> Self {
            Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[seed; 32]))
        }

        #[must_use]
        pub fn secp256k1(seed: u8) -> Self {
            Self::Secp256k1(
                k256::ecdsa::SigningKey::from_bytes(&[seed.max(1); 32].into())
                    .expect("valid secp256k1 scalar"),
            )
        }

        #[must_use]
        pub fn public_key(&self) -> PublicKey {
            match self {
                Self::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
                Self::Secp256k1(key) => PublicKey::Secp256k1(*key.verifying_key()),
            }
        }

        #[must_use]
        pub fn sign(&self, message: &[u8]) -> Vec<u8> {
            match self {
                Self::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
                Self::Secp256k1(key) => {
                    let signature: k256::ecdsa::Signature = key.sign(message);
                    signature.to_bytes().to_vec()
                }
            }
        }

        /// Signs `data` at `path` and encodes the proof.
        #[must_use]
        pub fn sign_proof(
            &self,
            codec: &ProofCodec,
            sequence: u64,
            timestamp: u64,
            path: &MerklePath,
            data_type: DataType,
            data: Vec<u8>,
            new_public_key: Option<PublicKey>,
        ) -> Vec<u8> {
            let sign_bytes = codec.sign_bytes(sequence, timestamp, path, data_type, data);
            codec.encode_proof(&SignedProof {
                timestamp,
                signature: self.sign(&sign_bytes),
                new_public_key,
            })
        }
    }

    /// A valid client controlled by `signer`.
    #[must_use]
    pub fn client_state(signer: &TestSigner, sequence: u64, timestamp: u64) -> ClientState {
        ClientState::new(
            CLIENT_ID,
            CHAIN_ID,
            ConsensusState::new(signer.public_key(), sequence, timestamp),
        )
    }
}
