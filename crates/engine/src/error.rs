//! Engine Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Failures from the identity, storage and resource
//! crates are wrapped here with their own error trees preserved as
//! children, so a caller can still tell a malformed conversion from a
//! broken disk.

use derive_more::{Display, Error};

/// An engine error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an engine failure.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Identifier canonicalization or registry seeding failed.
    #[display("identity error")]
    Identity,
    /// A storage tier operation failed.
    #[display("storage error")]
    Storage,
    /// A representation conversion failed (malformed input).
    #[display("conversion error")]
    Conversion,
    /// The TweakDB snapshot could not be read or parsed.
    #[display("TweakDB snapshot error")]
    TweakDb,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
