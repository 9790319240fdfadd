//! The `DPK1` packed container format.
//!
//! Archive base content ships as packed containers: a fixed header, an
//! entry table, then the blobs. Everything is little-endian.
//!
//! ```text
//! header:  magic "DPK1" | format version u32 | entry count u32
//! entry:   path hash u64 | blob offset u64 | stored size u64 | raw size u64
//!          | crc32 of stored bytes u32 | flags u8 | path length u16
//!          | canonical path bytes
//! blobs:   stored bytes, at the absolute offsets recorded above
//! ```
//!
//! The crc32 covers the *stored* bytes, so corruption is caught before any
//! attempt to inflate. Flag bit 0 marks a raw-deflate compressed blob.

use exn::ResultExt;
use flate2::Compression;
use flate2::read::{DeflateDecoder, DeflateEncoder};
use std::io::Read;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{ErrorKind, Result};
use depot_identity::{HashMethod, canonicalize, hash_path};

pub(crate) const MAGIC: [u8; 4] = *b"DPK1";
pub(crate) const FORMAT_VERSION: u32 = 1;
pub(crate) const FLAG_DEFLATE: u8 = 0b0000_0001;

/// Fixed-size portion of an entry record, excluding the trailing path.
const ENTRY_FIXED_LEN: usize = 8 + 8 + 8 + 8 + 4 + 1 + 2;
const HEADER_LEN: usize = 4 + 4 + 4;

/// One file inside a container.
#[derive(Debug, Clone)]
pub struct PackEntry {
    pub hash: u64,
    pub offset: u64,
    pub stored_size: u64,
    pub raw_size: u64,
    pub crc32: u32,
    pub flags: u8,
    pub path: Arc<str>,
}

impl PackEntry {
    pub fn is_deflated(&self) -> bool {
        self.flags & FLAG_DEFLATE != 0
    }

    /// Verify the stored bytes against the recorded checksum, then inflate
    /// if necessary.
    pub fn unpack(&self, stored: &[u8]) -> Result<Vec<u8>> {
        let actual = crc32fast::hash(stored);
        if actual != self.crc32 {
            exn::bail!(ErrorKind::Checksum {
                path: self.path.to_string(),
                expected: self.crc32,
                actual,
            });
        }
        if !self.is_deflated() {
            return Ok(stored.to_vec());
        }
        let mut raw = Vec::with_capacity(self.raw_size as usize);
        DeflateDecoder::new(stored)
            .read_to_end(&mut raw)
            .or_raise(|| ErrorKind::Corrupt(format!("inflate failed for {:?}", self.path)))?;
        if raw.len() as u64 != self.raw_size {
            exn::bail!(ErrorKind::Corrupt(format!(
                "inflated size mismatch for {:?}: expected {}, got {}",
                self.path,
                self.raw_size,
                raw.len()
            )));
        }
        Ok(raw)
    }
}

/// Parse the header and entry table from the front of a container.
pub(crate) async fn read_index<R>(reader: &mut R) -> Result<Vec<PackEntry>>
where
    R: AsyncRead + Unpin + Send,
{
    let mut header = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut header)
        .await
        .or_raise(|| ErrorKind::Corrupt("container shorter than its header".to_string()))?;
    if header[..4] != MAGIC {
        exn::bail!(ErrorKind::Corrupt("bad container magic".to_string()));
    }
    let version = u32::from_le_bytes(header[4..8].try_into().unwrap());
    if version != FORMAT_VERSION {
        exn::bail!(ErrorKind::Corrupt(format!("unsupported container version {version}")));
    }
    let count = u32::from_le_bytes(header[8..12].try_into().unwrap());

    let mut entries = Vec::with_capacity(count as usize);
    let mut fixed = [0u8; ENTRY_FIXED_LEN];
    for _ in 0..count {
        reader
            .read_exact(&mut fixed)
            .await
            .or_raise(|| ErrorKind::Corrupt("truncated entry table".to_string()))?;
        let path_len = u16::from_le_bytes(fixed[37..39].try_into().unwrap());
        let mut path_bytes = vec![0u8; path_len as usize];
        reader
            .read_exact(&mut path_bytes)
            .await
            .or_raise(|| ErrorKind::Corrupt("truncated entry path".to_string()))?;
        let path = String::from_utf8(path_bytes)
            .or_raise(|| ErrorKind::Corrupt("entry path is not UTF-8".to_string()))?;
        entries.push(PackEntry {
            hash: u64::from_le_bytes(fixed[0..8].try_into().unwrap()),
            offset: u64::from_le_bytes(fixed[8..16].try_into().unwrap()),
            stored_size: u64::from_le_bytes(fixed[16..24].try_into().unwrap()),
            raw_size: u64::from_le_bytes(fixed[24..32].try_into().unwrap()),
            crc32: u32::from_le_bytes(fixed[32..36].try_into().unwrap()),
            flags: fixed[36],
            path: path.into(),
        });
    }
    Ok(entries)
}

/// Builds `DPK1` containers, for packaging tools and tests.
///
/// # Examples
///
/// ```
/// use depot_storage::PackBuilder;
///
/// let bytes = PackBuilder::new()
///     .add("base/characters/nathan.ent", b"entity bytes".to_vec()).unwrap()
///     .add_deflated("base/big/level.sector", vec![0u8; 4096]).unwrap()
///     .build().unwrap();
/// assert_eq!(&bytes[..4], b"DPK1");
/// ```
#[derive(Debug, Default)]
pub struct PackBuilder {
    entries: Vec<BuildEntry>,
}

#[derive(Debug)]
struct BuildEntry {
    path: String,
    hash: u64,
    raw: Vec<u8>,
    deflate: bool,
}

impl PackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, stored uncompressed.
    ///
    /// The path is canonicalized and hashed here; adding the same path
    /// twice replaces the earlier data.
    pub fn add(self, path: &str, data: Vec<u8>) -> Result<Self> {
        self.push(path, data, false)
    }

    /// Add a file, stored as raw deflate.
    pub fn add_deflated(self, path: &str, data: Vec<u8>) -> Result<Self> {
        self.push(path, data, true)
    }

    fn push(mut self, path: &str, data: Vec<u8>, deflate: bool) -> Result<Self> {
        let canonical = canonicalize(path).or_raise(|| ErrorKind::InvalidPath(path.to_string()))?;
        if canonical.len() > u16::MAX as usize {
            exn::bail!(ErrorKind::InvalidPath(path.to_string()));
        }
        let hash = hash_path(&canonical, HashMethod::Default)
            .or_raise(|| ErrorKind::InvalidPath(path.to_string()))?;
        self.entries.retain(|entry| entry.path != canonical);
        self.entries.push(BuildEntry { path: canonical, hash, raw: data, deflate });
        Ok(self)
    }

    /// Serialize the container.
    pub fn build(self) -> Result<Vec<u8>> {
        let index_len: usize = HEADER_LEN
            + self.entries.iter().map(|entry| ENTRY_FIXED_LEN + entry.path.len()).sum::<usize>();

        // Compress up front so blob offsets can be laid out in one pass.
        let mut blobs: Vec<Vec<u8>> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let stored = match entry.deflate {
                false => entry.raw.clone(),
                true => {
                    let mut stored = Vec::new();
                    DeflateEncoder::new(&entry.raw[..], Compression::default())
                        .read_to_end(&mut stored)
                        .or_raise(|| ErrorKind::Corrupt(format!("deflate failed for {:?}", entry.path)))?;
                    stored
                },
            };
            blobs.push(stored);
        }

        let mut out = Vec::with_capacity(index_len + blobs.iter().map(Vec::len).sum::<usize>());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());

        let mut offset = index_len as u64;
        for (entry, stored) in self.entries.iter().zip(&blobs) {
            out.extend_from_slice(&entry.hash.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(stored.len() as u64).to_le_bytes());
            out.extend_from_slice(&(entry.raw.len() as u64).to_le_bytes());
            out.extend_from_slice(&crc32fast::hash(stored).to_le_bytes());
            out.push(if entry.deflate { FLAG_DEFLATE } else { 0 });
            out.extend_from_slice(&(entry.path.len() as u16).to_le_bytes());
            out.extend_from_slice(entry.path.as_bytes());
            offset += stored.len() as u64;
        }
        for stored in &blobs {
            out.extend_from_slice(stored);
        }
        debug_assert_eq!(out.len(), index_len + blobs.iter().map(Vec::len).sum::<usize>());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse(bytes: &[u8]) -> Vec<PackEntry> {
        let mut reader = bytes;
        read_index(&mut reader).await.unwrap()
    }

    #[tokio::test]
    async fn test_build_and_parse() {
        let bytes = PackBuilder::new()
            .add("A/B.ent", b"hello".to_vec())
            .unwrap()
            .add_deflated("a/c.mesh", b"world world world world".to_vec())
            .unwrap()
            .build()
            .unwrap();
        let entries = parse(&bytes).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(&*entries[0].path, "a/b.ent");
        assert_eq!(entries[0].raw_size, 5);
        assert!(!entries[0].is_deflated());
        assert!(entries[1].is_deflated());
    }

    #[tokio::test]
    async fn test_unpack_round_trip() {
        let data = b"some resource bytes, repeated enough to compress: aaaaaaaaaaaaaaaa".to_vec();
        let bytes = PackBuilder::new().add_deflated("x/y.bin", data.clone()).unwrap().build().unwrap();
        let entries = parse(&bytes).await;
        let entry = &entries[0];
        let stored = &bytes[entry.offset as usize..(entry.offset + entry.stored_size) as usize];
        assert_eq!(entry.unpack(stored).unwrap(), data);
    }

    #[tokio::test]
    async fn test_checksum_mismatch_detected() {
        let bytes = PackBuilder::new().add("x/y.bin", b"payload".to_vec()).unwrap().build().unwrap();
        let entries = parse(&bytes).await;
        let entry = &entries[0];
        let mut stored = bytes[entry.offset as usize..(entry.offset + entry.stored_size) as usize].to_vec();
        stored[0] ^= 0xff;
        let err = entry.unpack(&stored).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Checksum { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_path_replaces() {
        let bytes = PackBuilder::new()
            .add("a/b.ent", b"old".to_vec())
            .unwrap()
            .add("A//b.ent", b"new".to_vec())
            .unwrap()
            .build()
            .unwrap();
        let entries = parse(&bytes).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].raw_size, 3);
        let stored = &bytes[entries[0].offset as usize..];
        assert_eq!(entries[0].unpack(&stored[..3]).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_bad_magic_rejected() {
        let mut bytes = PackBuilder::new().add("a/b", b"x".to_vec()).unwrap().build().unwrap();
        bytes[0] = b'X';
        let mut reader = &bytes[..];
        let err = read_index(&mut reader).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_truncated_container_rejected() {
        let bytes = PackBuilder::new().add("a/b", b"x".to_vec()).unwrap().build().unwrap();
        let mut reader = &bytes[..bytes.len() / 2];
        assert!(read_index(&mut reader).await.is_err());
    }
}
