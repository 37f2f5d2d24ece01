//! Serde adapters used by persisted client state.
//!
//! JSON consumers routinely lose precision on 64-bit integers, so sequences and
//! timestamps are written as decimal strings. Raw key material is written as
//! standard base64.

/// Serialize a number as a string.
pub mod number_as_string {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Writes `number` as its decimal string.
    /// # Errors
    /// Returns an error if the serializer rejects the string.
    pub fn serialize<T, S>(number: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: ToString,
        S: Serializer,
    {
        serializer.serialize_str(&number.to_string())
    }

    /// Parses a number back from its decimal string.
    /// # Errors
    /// Returns an error if the string is not a valid number.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serialize a byte buffer as a base64 string.
pub mod base64_bytes {
    use base64::prelude::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Writes `data` as standard base64.
    /// # Errors
    /// Returns an error if the serializer rejects the string.
    pub fn serialize<S, T: AsRef<[u8]>>(data: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64_STANDARD.encode(data))
    }

    /// Decodes standard base64 into any type constructible from a `Vec<u8>`.
    /// # Errors
    /// Returns an error on invalid base64 or if the decoded bytes are rejected by `T`.
    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let s = String::deserialize(deserializer)?;
        let decoded = BASE64_STANDARD
            .decode(s.as_bytes())
            .map_err(de::Error::custom)?;
        T::try_from(decoded).map_err(|_| de::Error::custom("invalid byte length"))
    }
}
