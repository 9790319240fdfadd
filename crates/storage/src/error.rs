//! Storage Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.
//!
//! A lookup miss is never represented here: `exists` returns `false`,
//! `fetch` returns `None`, `delete` returns `false`. These kinds cover
//! faults — unsupported mutation, broken containers, real I/O failures.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Mutation attempted against a tier that does not support it. The
    /// archive base is immutable; writes fail fast here instead of
    /// pretending to succeed.
    #[display("{op} is not supported by the {tier} tier")]
    Unsupported { tier: &'static str, op: &'static str },
    /// Path failed canonicalization.
    #[display("invalid path: {_0:?}")]
    InvalidPath(#[error(not(source))] String),
    /// Scope name was not one of `archive`/`raw`/`resources`.
    #[display("unknown project scope: {_0:?}")]
    UnknownScope(#[error(not(source))] String),
    /// A mutation was addressed by bare hash and no path is known for it;
    /// the project tier stores files under paths and cannot invent one.
    #[display("no known path for hash {_0:#018x}")]
    PathUnknown(#[error(not(source))] u64),
    /// Underlying I/O error.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// A packed container is structurally damaged.
    #[display("corrupt archive container: {_0}")]
    Corrupt(#[error(not(source))] String),
    /// Stored blob bytes do not match their recorded checksum.
    #[display("checksum mismatch for {path:?}: expected {expected:#010x}, got {actual:#010x}")]
    Checksum { path: String, expected: u32, actual: u32 },
}

impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
