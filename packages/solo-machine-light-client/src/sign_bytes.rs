//! Canonical sign bytes.

use std::fmt;

use prost::Message;

use crate::{path::MerklePath, proto};

/// What a signature attests to. Part of the sign bytes, so a signature over
/// one kind of data never verifies as another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    /// Never signed
    Unspecified = 0,
    /// Consensus state of a client on the counterparty
    ConsensusState = 1,
    /// Connection end
    ConnectionState = 2,
    /// Channel end
    ChannelState = 3,
    /// Packet commitment
    PacketCommitment = 4,
    /// Packet acknowledgement
    PacketAcknowledgement = 5,
    /// Absence of a packet acknowledgement
    PacketAcknowledgementAbsence = 6,
    /// Next receive sequence of a channel
    NextSequenceRecv = 7,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unspecified => "unspecified",
            Self::ConsensusState => "client consensus state",
            Self::ConnectionState => "connection state",
            Self::ChannelState => "channel state",
            Self::PacketCommitment => "packet commitment",
            Self::PacketAcknowledgement => "packet acknowledgement",
            Self::PacketAcknowledgementAbsence => "packet acknowledgement absence",
            Self::NextSequenceRecv => "next sequence receive",
        };
        f.write_str(name)
    }
}

/// Deterministic encoding of `(sequence, timestamp, path, data_type, data)`.
#[must_use]
pub fn sign_bytes(
    sequence: u64,
    timestamp: u64,
    path: &MerklePath,
    data_type: DataType,
    data: Vec<u8>,
) -> Vec<u8> {
    proto::SignBytes {
        sequence,
        timestamp,
        path: Some(path.clone()),
        data_type: data_type.into(),
        data,
    }
    .encode_to_vec()
}
