//! Shared helpers for the solo machine workspace.

#![doc = include_str!("../README.md")]
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

#[cfg(test)]
use serde_json as _;

pub mod serde;

/// Ensure that a condition is true, otherwise return an error.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
}
