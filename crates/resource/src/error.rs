//! Resource Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A conversion error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// The three malformed-input kinds are deliberately distinct so a caller
/// can tell *which* side of a conversion was bad. All of them are
/// recoverable; none leave partial state anywhere.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Binary structured data is truncated, mistagged, or otherwise not a
    /// well-formed resource.
    #[display("malformed resource: {_0}")]
    MalformedResource(#[error(not(source))] String),
    /// JSON input does not describe a resource (or is not JSON at all).
    #[display("malformed JSON: {_0}")]
    MalformedJson(#[error(not(source))] String),
    /// YAML input could not be parsed or emitted.
    #[display("malformed YAML: {_0}")]
    MalformedYaml(#[error(not(source))] String),
    /// Representation name was not one of `raw`/`resource`/`json`.
    #[display("unknown representation: {_0:?}")]
    UnknownRepresentation(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
