//! Tagged file identifiers.

use std::fmt;
use std::sync::Arc;

/// How a caller names a file: a resource path or a 64-bit hash.
///
/// The scripting surface overloads every lookup over both forms; internally
/// there is exactly one code path taking this tagged union.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileIdentifier {
    /// A resource path, in any spelling; canonicalized before use.
    Path(String),
    /// A stable 64-bit path hash.
    Hash(u64),
}

impl From<&str> for FileIdentifier {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}
impl From<String> for FileIdentifier {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}
impl From<u64> for FileIdentifier {
    fn from(hash: u64) -> Self {
        Self::Hash(hash)
    }
}

impl fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Hash(hash) => write!(f, "{hash:#018x}"),
        }
    }
}

/// A normalized identity: the default hash, plus the canonical path when
/// one is known.
///
/// Produced by [`IdentityRegistry::resolve`](crate::IdentityRegistry::resolve).
/// A hash the registry has never seen yields `path: None`; that is a normal
/// outcome (the file may still exist in a store that indexes by hash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub hash: u64,
    pub path: Option<Arc<str>>,
}

impl Identity {
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}
