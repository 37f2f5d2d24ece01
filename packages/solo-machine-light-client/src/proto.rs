//! Protobuf wire messages of the solo machine client.

use prost::Message;

/// Public key with its algorithm, as `CometBFT` encodes it: Ed25519 under
/// tag 1, compressed secp256k1 under tag 2.
pub use tendermint_proto::crypto::{public_key, PublicKey};

/// The proof envelope: a signature, the time it certifies and an optional
/// rotated key.
#[derive(Clone, PartialEq, Message)]
pub struct TimestampedSignature {
    /// Raw signature over the sign bytes
    #[prost(bytes = "vec", tag = "1")]
    pub signature: Vec<u8>,
    /// Moment the signature certifies
    #[prost(uint64, tag = "2")]
    pub timestamp: u64,
    /// Key that replaces the current one once the proof is accepted
    #[prost(message, optional, tag = "3")]
    pub new_public_key: Option<PublicKey>,
}

/// The message a solo machine signs.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct SignBytes {
    /// Current sequence of the client
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    /// Timestamp of the signature
    #[prost(uint64, tag = "2")]
    pub timestamp: u64,
    /// Fully qualified commitment path
    #[prost(message, optional, tag = "3")]
    pub path: Option<crate::path::MerklePath>,
    /// Kind of `data`
    #[prost(enumeration = "crate::sign_bytes::DataType", tag = "4")]
    pub data_type: i32,
    /// Encoded payload, empty for absence claims
    #[prost(bytes = "vec", tag = "5")]
    pub data: Vec<u8>,
}
