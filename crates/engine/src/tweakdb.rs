//! TweakDB flat key-value spaces.
//!
//! A separate lookup namespace from game files: records, flats, queries
//! and group tags, each keyed by a dotted-ish path string. Loaded once per
//! session from a JSON snapshot and immutable afterwards. Every loaded
//! path is also indexed by its FNV-1a 64 key — the TDBID — mirroring the
//! identity registry's path↔hash contract, but deliberately scoped to
//! this subsystem and never mixed with file hashes.

use exn::ResultExt;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::error::{ErrorKind, Result};
use depot_identity::fnv1a64;

/// On-disk snapshot shape.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Snapshot {
    records: BTreeMap<String, String>,
    flats: BTreeMap<String, String>,
    queries: BTreeMap<String, Vec<String>>,
    group_tags: BTreeMap<String, u8>,
}

/// Immutable in-memory TweakDB view.
///
/// Misses are `None` (or an empty list for queries), never errors.
#[derive(Debug, Default)]
pub struct TweakDb {
    records: BTreeMap<Arc<str>, String>,
    flats: BTreeMap<Arc<str>, String>,
    queries: BTreeMap<Arc<str>, Vec<String>>,
    group_tags: BTreeMap<Arc<str>, u8>,
    by_key: HashMap<u64, Arc<str>>,
}

impl TweakDb {
    /// A view with nothing in it, for sessions configured without a
    /// snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON snapshot.
    pub fn from_snapshot(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json).or_raise(|| ErrorKind::TweakDb)?;
        let mut by_key = HashMap::new();
        let db = Self {
            records: snapshot.records.into_iter().map(|(path, value)| (index(&mut by_key, path), value)).collect(),
            flats: snapshot.flats.into_iter().map(|(path, value)| (index(&mut by_key, path), value)).collect(),
            queries: snapshot.queries.into_iter().map(|(path, value)| (index(&mut by_key, path), value)).collect(),
            group_tags: snapshot
                .group_tags
                .into_iter()
                .map(|(path, value)| (index(&mut by_key, path), value))
                .collect(),
            by_key,
        };
        tracing::info!(
            records = db.records.len(),
            flats = db.flats.len(),
            queries = db.queries.len(),
            group_tags = db.group_tags.len(),
            "loaded TweakDB snapshot"
        );
        Ok(db)
    }

    /// Read and parse a snapshot file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path.as_ref()).await.or_raise(|| ErrorKind::TweakDb)?;
        Self::from_snapshot(&json)
    }

    pub fn records(&self) -> Vec<String> {
        self.records.keys().map(ToString::to_string).collect()
    }

    pub fn flats(&self) -> Vec<String> {
        self.flats.keys().map(ToString::to_string).collect()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.keys().map(ToString::to_string).collect()
    }

    pub fn group_tags(&self) -> Vec<String> {
        self.group_tags.keys().map(ToString::to_string).collect()
    }

    pub fn record(&self, path: &str) -> Option<&str> {
        self.records.get(path).map(String::as_str)
    }

    pub fn flat(&self, path: &str) -> Option<&str> {
        self.flats.get(path).map(String::as_str)
    }

    /// Query results; an unknown query is an empty list.
    pub fn query(&self, path: &str) -> Vec<String> {
        self.queries.get(path).cloned().unwrap_or_default()
    }

    pub fn group_tag(&self, path: &str) -> Option<u8> {
        self.group_tags.get(path).copied()
    }

    /// Whether any space knows this path.
    pub fn has_tdbid(&self, path: &str) -> bool {
        self.by_key.contains_key(&fnv1a64(path.as_bytes()))
    }

    /// Reverse the TDBID bijection.
    pub fn path_for_key(&self, key: u64) -> Option<&str> {
        self.by_key.get(&key).map(|path| &**path)
    }
}

/// Key a path by its TDBID. The path string is hashed as given — TweakDB
/// paths are their own namespace with their own spelling.
fn index(by_key: &mut HashMap<u64, Arc<str>>, path: String) -> Arc<str> {
    let path: Arc<str> = path.into();
    let key = fnv1a64(path.as_bytes());
    if let Some(existing) = by_key.insert(key, Arc::clone(&path))
        && existing != path
    {
        tracing::warn!(key, %existing, %path, "TDBID collision; keeping the newer path");
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "records": { "Items.Preset_Ajax": "gamedataWeaponItem_Record" },
        "flats": { "Items.Preset_Ajax.displayName": "LocKey#12345" },
        "queries": { "Items.AllWeapons": ["Items.Preset_Ajax"] },
        "groupTags": { "Items.Ranged": 3 }
    }"#;

    #[test]
    fn test_lookups() {
        let db = TweakDb::from_snapshot(SNAPSHOT).unwrap();
        assert_eq!(db.record("Items.Preset_Ajax"), Some("gamedataWeaponItem_Record"));
        assert_eq!(db.flat("Items.Preset_Ajax.displayName"), Some("LocKey#12345"));
        assert_eq!(db.query("Items.AllWeapons"), vec!["Items.Preset_Ajax".to_string()]);
        assert_eq!(db.group_tag("Items.Ranged"), Some(3));
        assert_eq!(db.records(), vec!["Items.Preset_Ajax".to_string()]);
    }

    #[test]
    fn test_misses_are_values() {
        let db = TweakDb::from_snapshot(SNAPSHOT).unwrap();
        assert_eq!(db.record("Items.Nope"), None);
        assert_eq!(db.query("Items.Nope"), Vec::<String>::new());
        assert_eq!(db.group_tag("Items.Nope"), None);
        assert!(!db.has_tdbid("Items.Nope"));
        assert_eq!(db.path_for_key(0xbad), None);
    }

    #[test]
    fn test_tdbid_bijection() {
        let db = TweakDb::from_snapshot(SNAPSHOT).unwrap();
        let key = fnv1a64(b"Items.Preset_Ajax");
        assert!(db.has_tdbid("Items.Preset_Ajax"));
        assert_eq!(db.path_for_key(key), Some("Items.Preset_Ajax"));
    }

    #[test]
    fn test_empty_view() {
        let db = TweakDb::empty();
        assert!(db.records().is_empty());
        assert_eq!(db.path_for_key(1), None);
    }

    #[test]
    fn test_malformed_snapshot() {
        let err = TweakDb::from_snapshot("[]").unwrap_err();
        assert!(matches!(&*err, ErrorKind::TweakDb));
    }
}
