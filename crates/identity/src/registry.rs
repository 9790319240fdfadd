//! The session-lifetime path/hash registry.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ErrorKind, Result};
use crate::fnv::fnv1a64;
use crate::ident::{FileIdentifier, Identity};
use crate::path::canonicalize;

/// Which hashing algorithm to apply to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashMethod {
    /// The system's native path hash: the first eight little-endian bytes
    /// of the BLAKE3 digest of the canonical path. This is the hash the
    /// registry, the archive index and the lookup cache are all keyed by.
    /// Fixed and stable across sessions; treat it as an external contract.
    #[default]
    Default,
    /// FNV-1a 64 over the canonical path, for callers that need the
    /// classic non-cryptographic hash (TweakDB keys use it too).
    Fnv1a64,
}

impl FromStr for HashMethod {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(Self::Default),
            "fnv1a64" => Ok(Self::Fnv1a64),
            other => exn::bail!(ErrorKind::UnknownHashMethod(other.to_string())),
        }
    }
}

/// Hash a path with the given method.
///
/// Pure: canonicalizes, then hashes the canonical UTF-8 bytes. No I/O and
/// no dependence on registry or store state.
///
/// # Examples
///
/// ```
/// use depot_identity::{HashMethod, fnv1a64, hash_path};
///
/// let hash = hash_path("Characters\\Nathan.ent", HashMethod::Fnv1a64).unwrap();
/// assert_eq!(hash, fnv1a64(b"characters/nathan.ent"));
/// ```
pub fn hash_path(path: &str, method: HashMethod) -> Result<u64> {
    let canonical = canonicalize(path)?;
    Ok(hash_str(&canonical, method))
}

/// Hash an arbitrary string with the given method, as-is.
///
/// No canonicalization: this is the raw string-hashing primitive behind
/// the scripting surface, where non-path namespaces (TweakDB ids) keep
/// their own spelling. File identities should go through [`hash_path`].
pub fn hash_str(data: &str, method: HashMethod) -> u64 {
    match method {
        HashMethod::Default => default_hash(data),
        HashMethod::Fnv1a64 => fnv1a64(data.as_bytes()),
    }
}

fn default_hash(canonical: &str) -> u64 {
    let digest = blake3::hash(canonical.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// Bidirectional mapping between canonical paths and their default hashes.
///
/// Populated once at session start from archive metadata, read-only
/// afterwards. Within a session a hash is never reassigned to a different
/// path; a collision during load is an integrity error, not something to
/// paper over.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    by_hash: HashMap<u64, Arc<str>>,
    by_path: HashMap<Arc<str>, u64>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path, returning its default hash.
    ///
    /// Idempotent for the same path. Registering a *different* path that
    /// lands on an existing hash fails with
    /// [`HashCollision`](ErrorKind::HashCollision).
    pub fn register(&mut self, path: &str) -> Result<u64> {
        let canonical: Arc<str> = canonicalize(path)?.into();
        let hash = default_hash(&canonical);
        if let Some(existing) = self.by_hash.get(&hash) {
            if **existing != *canonical {
                exn::bail!(ErrorKind::HashCollision {
                    hash,
                    existing: existing.to_string(),
                    incoming: canonical.to_string(),
                });
            }
            return Ok(hash);
        }
        self.by_hash.insert(hash, Arc::clone(&canonical));
        self.by_path.insert(canonical, hash);
        Ok(hash)
    }

    /// Look up the canonical path for a hash.
    ///
    /// `None` means the hash is unknown to this session's metadata, which
    /// callers must treat as a normal outcome.
    pub fn path_for(&self, hash: u64) -> Option<&str> {
        self.by_hash.get(&hash).map(|path| &**path)
    }

    /// Hash a path without touching registry state.
    ///
    /// Provided on the registry for discoverability; identical to the free
    /// function [`hash_path`].
    pub fn hash_for(&self, path: &str, method: HashMethod) -> Result<u64> {
        hash_path(path, method)
    }

    /// Normalize a tagged identifier to `(default hash, canonical path)`.
    ///
    /// For a path input, the canonical path is always present (registered
    /// or not). For a hash input the path is whatever the registry knows,
    /// possibly nothing.
    pub fn resolve(&self, identifier: &FileIdentifier) -> Result<Identity> {
        match identifier {
            FileIdentifier::Path(path) => {
                let canonical = canonicalize(path)?;
                let hash = default_hash(&canonical);
                let path = match self.by_hash.get(&hash) {
                    Some(registered) => Arc::clone(registered),
                    None => canonical.into(),
                };
                Ok(Identity { hash, path: Some(path) })
            },
            FileIdentifier::Hash(hash) => Ok(Identity {
                hash: *hash,
                path: self.by_hash.get(hash).cloned(),
            }),
        }
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_methods_are_distinct() {
        let default = hash_path("base/characters/nathan.ent", HashMethod::Default).unwrap();
        let fnv = hash_path("base/characters/nathan.ent", HashMethod::Fnv1a64).unwrap();
        assert_ne!(default, fnv);
        assert_eq!(fnv, fnv1a64(b"base/characters/nathan.ent"));
    }

    #[test]
    fn test_hashing_canonicalizes_first() {
        let a = hash_path(r"Base\Characters\Nathan.ent", HashMethod::Default).unwrap();
        let b = hash_path("base/characters/nathan.ent", HashMethod::Default).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("default".parse::<HashMethod>().unwrap(), HashMethod::Default);
        assert_eq!("fnv1a64".parse::<HashMethod>().unwrap(), HashMethod::Fnv1a64);
        let err = "sha256".parse::<HashMethod>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownHashMethod(_)));
    }

    #[test]
    fn test_register_round_trip() {
        let mut registry = IdentityRegistry::new();
        let hash = registry.register("Base/Characters/Nathan.ent").unwrap();
        assert_eq!(registry.path_for(hash), Some("base/characters/nathan.ent"));
        // Bijection: hashing the stored path reproduces the stored hash.
        assert_eq!(registry.hash_for("base/characters/nathan.ent", HashMethod::Default).unwrap(), hash);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = IdentityRegistry::new();
        let first = registry.register("a/b.ent").unwrap();
        let second = registry.register(r"A\b.ent").unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_hash_is_none() {
        let registry = IdentityRegistry::new();
        assert_eq!(registry.path_for(0xdead_beef), None);
    }

    #[test]
    fn test_resolve_path_identifier() {
        let registry = IdentityRegistry::new();
        let identity = registry.resolve(&FileIdentifier::from("A//B.ent")).unwrap();
        assert_eq!(identity.path(), Some("a/b.ent"));
        assert_eq!(identity.hash, hash_path("a/b.ent", HashMethod::Default).unwrap());
    }

    #[test]
    fn test_resolve_hash_identifier() {
        let mut registry = IdentityRegistry::new();
        let hash = registry.register("a/b.ent").unwrap();
        let known = registry.resolve(&FileIdentifier::from(hash)).unwrap();
        assert_eq!(known.path(), Some("a/b.ent"));
        let unknown = registry.resolve(&FileIdentifier::from(1u64)).unwrap();
        assert_eq!(unknown.path(), None);
        assert_eq!(unknown.hash, 1);
    }
}
