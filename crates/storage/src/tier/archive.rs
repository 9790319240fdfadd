//! The immutable archive base.
//!
//! Game content lives in `DPK1` containers (see [`pack`](crate::pack)).
//! The store loads every container's entry table once at open and answers
//! lookups by path hash from then on; blob bytes are read lazily per
//! fetch. Nothing here ever mutates — the project overlay shadows archive
//! files instead of replacing them — and mutation attempts fail fast
//! rather than pretending to succeed.

use async_trait::async_trait;
use exn::ResultExt;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

use crate::error::{ErrorKind, Result};
use crate::pack::{PackEntry, read_index};
use crate::tier::{Store, Tier};
use depot_identity::Identity;

/// Read-only store over one or more packed containers.
///
/// Containers are consulted in load order; the first one holding a hash
/// wins. Safe to share across any number of concurrent readers.
#[derive(Debug)]
pub struct ArchiveStore {
    packs: Vec<Pack>,
}

#[derive(Debug)]
struct Pack {
    source: PackSource,
    entries: Vec<PackEntry>,
    by_hash: HashMap<u64, usize>,
}

#[derive(Debug)]
enum PackSource {
    File(PathBuf),
    Memory(Vec<u8>),
}

impl Pack {
    fn new(source: PackSource, entries: Vec<PackEntry>) -> Self {
        let by_hash = entries.iter().enumerate().map(|(index, entry)| (entry.hash, index)).collect();
        Self { source, entries, by_hash }
    }

    async fn read_stored(&self, entry: &PackEntry) -> Result<Vec<u8>> {
        let (offset, len) = (entry.offset, entry.stored_size as usize);
        match &self.source {
            PackSource::Memory(bytes) => {
                let end = offset as usize + len;
                if end > bytes.len() {
                    exn::bail!(ErrorKind::Corrupt(format!("blob for {:?} extends past container end", entry.path)));
                }
                Ok(bytes[offset as usize..end].to_vec())
            },
            PackSource::File(path) => {
                let mut file = File::open(path).await.map_err(ErrorKind::Io)?;
                file.seek(SeekFrom::Start(offset)).await.map_err(ErrorKind::Io)?;
                let mut stored = vec![0u8; len];
                file.read_exact(&mut stored)
                    .await
                    .or_raise(|| ErrorKind::Corrupt(format!("blob for {:?} extends past container end", entry.path)))?;
                Ok(stored)
            },
        }
    }
}

impl ArchiveStore {
    /// Open containers from disk.
    ///
    /// Entry tables are read and validated eagerly; a damaged container
    /// fails the whole open rather than surfacing later as phantom misses.
    pub async fn open(paths: impl IntoIterator<Item = impl AsRef<Path>>) -> Result<Self> {
        let mut packs = Vec::new();
        for path in paths {
            let path = path.as_ref().to_path_buf();
            let mut file = File::open(&path).await.map_err(ErrorKind::Io)?;
            let entries = read_index(&mut file).await?;
            tracing::info!(container = %path.display(), entries = entries.len(), "loaded archive container");
            packs.push(Pack::new(PackSource::File(path), entries));
        }
        Ok(Self { packs })
    }

    /// Open a single in-memory container (packaging tools, tests).
    pub async fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut reader = &bytes[..];
        let entries = read_index(&mut reader).await?;
        Ok(Self {
            packs: vec![Pack::new(PackSource::Memory(bytes), entries)],
        })
    }

    /// Every `(canonical path, hash)` pair across all containers, in
    /// container order. This is the metadata the identity registry is
    /// seeded from at session start.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.packs.iter().flat_map(|pack| pack.entries.iter().map(|entry| (&*entry.path, entry.hash)))
    }

    /// List the distinct canonical paths available in the base content.
    pub fn list(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries().filter(|(_, hash)| seen.insert(*hash)).map(|(path, _)| path.to_string()).collect()
    }

    fn find(&self, hash: u64) -> Option<(&Pack, &PackEntry)> {
        self.packs.iter().find_map(|pack| {
            pack.by_hash.get(&hash).map(|&index| (pack, &pack.entries[index]))
        })
    }
}

#[async_trait]
impl Store for ArchiveStore {
    fn name(&self) -> &str {
        "archive"
    }

    fn tier(&self) -> Tier {
        Tier::Archive
    }

    async fn exists(&self, id: &Identity) -> Result<bool> {
        Ok(self.find(id.hash).is_some())
    }

    async fn fetch(&self, id: &Identity) -> Result<Option<Vec<u8>>> {
        let Some((pack, entry)) = self.find(id.hash) else {
            return Ok(None);
        };
        let stored = pack.read_stored(entry).await?;
        Ok(Some(entry.unpack(&stored)?))
    }

    async fn write(&self, _id: &Identity, _data: &[u8]) -> Result<()> {
        exn::bail!(ErrorKind::Unsupported { tier: "archive", op: "write" });
    }

    async fn delete(&self, _id: &Identity) -> Result<bool> {
        exn::bail!(ErrorKind::Unsupported { tier: "archive", op: "delete" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackBuilder;
    use depot_identity::{FileIdentifier, HashMethod, IdentityRegistry, hash_path};

    async fn archive(files: &[(&str, &[u8])]) -> ArchiveStore {
        let mut builder = PackBuilder::new();
        for (path, data) in files {
            builder = builder.add(path, data.to_vec()).unwrap();
        }
        ArchiveStore::from_bytes(builder.build().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_fetch_by_path_identity() {
        let store = archive(&[("a/b.ent", b"entity")]).await;
        let registry = IdentityRegistry::new();
        let id = registry.resolve(&FileIdentifier::from("A//b.ent")).unwrap();
        assert!(store.exists(&id).await.unwrap());
        assert_eq!(store.fetch(&id).await.unwrap().as_deref(), Some(&b"entity"[..]));
    }

    #[tokio::test]
    async fn test_fetch_by_bare_hash() {
        let store = archive(&[("a/b.ent", b"entity")]).await;
        // No registry involved: the archive indexes by hash directly.
        let id = Identity {
            hash: hash_path("a/b.ent", HashMethod::Default).unwrap(),
            path: None,
        };
        assert_eq!(store.fetch(&id).await.unwrap().as_deref(), Some(&b"entity"[..]));
    }

    #[tokio::test]
    async fn test_miss_is_a_value() {
        let store = archive(&[("a/b.ent", b"entity")]).await;
        let id = Identity { hash: 0xbad, path: None };
        assert!(!store.exists(&id).await.unwrap());
        assert_eq!(store.fetch(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mutation_fails_fast() {
        let store = archive(&[]).await;
        let id = Identity { hash: 1, path: None };
        let err = store.write(&id, b"x").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unsupported { tier: "archive", op: "write" }));
        let err = store.delete(&id).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unsupported { tier: "archive", op: "delete" }));
    }

    #[tokio::test]
    async fn test_deflated_entry_round_trips() {
        let data = vec![7u8; 10_000];
        let bytes = PackBuilder::new().add_deflated("big/blob.bin", data.clone()).unwrap().build().unwrap();
        assert!(bytes.len() < data.len());
        let store = ArchiveStore::from_bytes(bytes).await.unwrap();
        let id = Identity {
            hash: hash_path("big/blob.bin", HashMethod::Default).unwrap(),
            path: None,
        };
        assert_eq!(store.fetch(&id).await.unwrap().unwrap(), data);
    }

    #[tokio::test]
    async fn test_open_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let container = dir.path().join("base.dpk");
        let bytes = PackBuilder::new().add("a/b.ent", b"entity".to_vec()).unwrap().build().unwrap();
        std::fs::write(&container, bytes).unwrap();
        let store = ArchiveStore::open([&container]).await.unwrap();
        let id = Identity {
            hash: hash_path("a/b.ent", HashMethod::Default).unwrap(),
            path: None,
        };
        assert_eq!(store.fetch(&id).await.unwrap().as_deref(), Some(&b"entity"[..]));
    }

    #[tokio::test]
    async fn test_first_container_wins() {
        let first = PackBuilder::new().add("a/b.ent", b"first".to_vec()).unwrap().build().unwrap();
        let second = PackBuilder::new().add("a/b.ent", b"second".to_vec()).unwrap().build().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let paths = [dir.path().join("one.dpk"), dir.path().join("two.dpk")];
        std::fs::write(&paths[0], first).unwrap();
        std::fs::write(&paths[1], second).unwrap();
        let store = ArchiveStore::open(&paths).await.unwrap();
        let id = Identity {
            hash: hash_path("a/b.ent", HashMethod::Default).unwrap(),
            path: None,
        };
        assert_eq!(store.fetch(&id).await.unwrap().as_deref(), Some(&b"first"[..]));
        assert_eq!(store.list().len(), 1);
    }

    #[tokio::test]
    async fn test_entries_seed_registry() {
        let store = archive(&[("a/b.ent", b"1"), ("c/d.mesh", b"2")]).await;
        let mut registry = IdentityRegistry::new();
        for (path, hash) in store.entries() {
            assert_eq!(registry.register(path).unwrap(), hash);
        }
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_container_fails_open() {
        let err = ArchiveStore::from_bytes(b"not a container".to_vec()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Corrupt(_)));
    }
}
