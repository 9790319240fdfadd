//! Identity Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// An identity error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Lookup misses are *not* errors anywhere in this crate; they are `None`
/// returns. These kinds cover genuinely invalid input and registry
/// integrity violations.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Path is empty, escapes the root, or contains forbidden bytes.
    #[display("invalid resource path: {_0:?}")]
    InvalidPath(#[error(not(source))] String),
    /// Hash method string was neither `default` nor `fnv1a64`.
    #[display("unknown hash method: {_0:?}")]
    UnknownHashMethod(#[error(not(source))] String),
    /// Two distinct paths produced the same default hash. The registry
    /// never reassigns a hash within a session, so this aborts the load.
    #[display("hash collision on {hash:#018x}: {existing:?} vs {incoming:?}")]
    HashCollision {
        hash: u64,
        existing: String,
        incoming: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
