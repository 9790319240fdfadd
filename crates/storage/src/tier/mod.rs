//! Store trait and the two tier implementations.
//!
//! This module defines the [`Store`] trait, the read/write interface shared
//! by the two tiers a file identity can resolve against: the mutable
//! project overlay and the immutable archive base.

mod archive;
mod project;

pub use self::archive::ArchiveStore;
pub use self::project::ProjectStore;

use async_trait::async_trait;
use futures::Stream;
use std::fmt;
use std::pin::Pin;

use crate::error::Result;
use depot_identity::Identity;

pub type PathStream<'a> = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;

/// The storage layer an identity resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// The mutable project overlay.
    Project,
    /// The immutable archive base.
    Archive,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Project => "project",
            Self::Archive => "archive",
        })
    }
}

/// Unified interface over storage tiers.
///
/// Operations take a normalized [`Identity`] — a default path hash plus the
/// canonical path when one is known — so a caller holding only a hash can
/// still query tiers that index by hash.
///
/// # Absence is a value
/// A missing file is a *normal outcome* for this whole subsystem:
/// `exists` returns `false`, `fetch` returns `Ok(None)` and `delete`
/// returns `Ok(false)`. Errors are reserved for faults (I/O, corruption,
/// unsupported mutation).
///
/// # Examples
///
/// ```no_run
/// use depot_identity::{FileIdentifier, IdentityRegistry};
/// use depot_storage::{Store, error::Result};
///
/// async fn size_of(store: &dyn Store, registry: &IdentityRegistry) -> Result<Option<usize>> {
///     let id = registry.resolve(&FileIdentifier::from("base/characters/nathan.ent")).unwrap();
///     Ok(store.fetch(&id).await?.map(|data| data.len()))
/// }
/// ```
#[async_trait]
pub trait Store: Send + Sync {
    /// Name of the store, for logging.
    fn name(&self) -> &str;

    /// Which tier this store is.
    fn tier(&self) -> Tier;

    /// Check whether the identity exists in this tier.
    async fn exists(&self, id: &Identity) -> Result<bool>;

    /// Fetch file contents. `Ok(None)` on a miss.
    ///
    /// Callers receive an owned copy, never a view into store internals.
    async fn fetch(&self, id: &Identity) -> Result<Option<Vec<u8>>>;

    /// Write file contents.
    ///
    /// Immutable tiers fail fast with
    /// [`Unsupported`](crate::error::ErrorKind::Unsupported). Mutable tiers
    /// must make the write atomic: a concurrent or subsequent `exists`/
    /// `fetch` never observes a partial file.
    async fn write(&self, id: &Identity, data: &[u8]) -> Result<()>;

    /// Delete a file, returning whether it existed.
    ///
    /// Deleting a nonexistent file is not an error; it returns `false`.
    /// Immutable tiers fail fast with
    /// [`Unsupported`](crate::error::ErrorKind::Unsupported).
    async fn delete(&self, id: &Identity) -> Result<bool>;
}
