//! The scripting session.
//!
//! One [`Session`] per embedding, constructed once and owning the
//! identity registry, both storage tiers, the lookup cache and the
//! TweakDB view. The method surface here is what scripts call; it is a
//! flat namespace of operations, but the state behind it is explicit
//! rather than ambient.
//!
//! Conventions, uniformly applied:
//! - a lookup miss is a value (`None`/`false`/empty), never an error;
//! - every operation that mutates the project clears the export lookup
//!   cache wholesale;
//! - path-or-hash overloads collapse into one method over
//!   [`FileIdentifier`], and deprecated script aliases are thin calls
//!   into the canonical method.

use exn::ResultExt;
use std::sync::Arc;

use crate::cache::LookupCache;
use crate::error::{ErrorKind, Result};
use crate::export::{self, ExportOutcome, ExportSettings};
use crate::resolve::{GameFile, Resolver, TierScope};
use crate::tweakdb::TweakDb;
use depot_config::DepotConfig;
use depot_identity::{FileIdentifier, HashMethod, IdentityRegistry, change_extension, hash_str};
use depot_resource::{self as resource, Payload, Representation, Resource, convert};
use depot_storage::{ArchiveStore, ProjectScope, ProjectStore};

/// A single modding session: project overlay + archive base + lookup
/// state.
pub struct Session {
    resolver: Resolver,
    cache: LookupCache,
    tweakdb: TweakDb,
}

impl Session {
    /// Open a session from configuration: load archive containers, seed
    /// the identity registry from their entry tables, open the project
    /// root and read the TweakDB snapshot if one is configured.
    pub async fn open(config: &DepotConfig) -> Result<Self> {
        let archive = ArchiveStore::open(&config.archives).await.or_raise(|| ErrorKind::Storage)?;
        let project = ProjectStore::new(&config.project_root).or_raise(|| ErrorKind::Storage)?;
        let tweakdb = match &config.tweakdb {
            Some(path) => TweakDb::load(path).await?,
            None => TweakDb::empty(),
        };
        Self::from_parts(project, archive, tweakdb)
    }

    /// Assemble a session from already-constructed parts.
    pub fn from_parts(project: ProjectStore, archive: ArchiveStore, tweakdb: TweakDb) -> Result<Self> {
        let mut registry = IdentityRegistry::new();
        for (path, _) in archive.entries() {
            registry.register(path).or_raise(|| ErrorKind::Identity)?;
        }
        tracing::info!(known_files = registry.len(), "session opened");
        Ok(Self {
            resolver: Resolver::new(registry, Arc::new(project), Arc::new(archive)),
            cache: LookupCache::new(),
            tweakdb,
        })
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    // ---- resolution ------------------------------------------------------

    /// Load a file from the project or, failing that, the archive base.
    pub async fn get_file(
        &self,
        identifier: impl Into<FileIdentifier>,
        representation: Representation,
    ) -> Result<Option<GameFile>> {
        self.resolver.resolve(&identifier.into(), representation, TierScope::Either).await
    }

    /// Load a file from the project only.
    pub async fn get_file_from_project(
        &self,
        identifier: impl Into<FileIdentifier>,
        representation: Representation,
    ) -> Result<Option<GameFile>> {
        self.resolver.resolve(&identifier.into(), representation, TierScope::Project).await
    }

    /// Load a file from the archive base only.
    pub async fn get_file_from_archive(
        &self,
        identifier: impl Into<FileIdentifier>,
        representation: Representation,
    ) -> Result<Option<GameFile>> {
        self.resolver.resolve(&identifier.into(), representation, TierScope::Archive).await
    }

    // ---- existence -------------------------------------------------------

    async fn cached_exists(&self, identifier: FileIdentifier, scope: TierScope) -> Result<bool> {
        let identity = self.resolver.identity(&identifier)?;
        if let Some(located) = self.cache.get(identity.hash, scope).await {
            return Ok(located.is_some());
        }
        let located = self.resolver.locate(&identity, scope).await?;
        self.cache.put(identity.hash, scope, located).await;
        Ok(located.is_some())
    }

    /// Does the file exist in either tier?
    pub async fn file_exists(&self, identifier: impl Into<FileIdentifier>) -> Result<bool> {
        self.cached_exists(identifier.into(), TierScope::Either).await
    }

    /// Does the file exist in the project overlay?
    pub async fn file_exists_in_project(&self, identifier: impl Into<FileIdentifier>) -> Result<bool> {
        self.cached_exists(identifier.into(), TierScope::Project).await
    }

    /// Does the file exist in the archive base?
    pub async fn file_exists_in_archive(&self, identifier: impl Into<FileIdentifier>) -> Result<bool> {
        self.cached_exists(identifier.into(), TierScope::Archive).await
    }

    /// Does a file exist in the project `raw` scope?
    pub async fn file_exists_in_raw(&self, path: &str) -> Result<bool> {
        self.resolver.project().exists_in(ProjectScope::Raw, path).await.or_raise(|| ErrorKind::Storage)
    }

    // ---- enumeration -----------------------------------------------------

    /// Paths currently present under one project scope. Order is
    /// unspecified.
    pub async fn get_project_files(&self, scope: ProjectScope) -> Result<Vec<String>> {
        self.resolver.project().list(scope).await.or_raise(|| ErrorKind::Storage)
    }

    /// Paths available in the archive base.
    pub fn get_archive_files(&self) -> Vec<String> {
        self.resolver.archive().list()
    }

    // ---- project mutation ------------------------------------------------

    /// Save a payload as a game file in the project `archive` mirror.
    ///
    /// Structured and JSON payloads are encoded to their binary form
    /// first; what lands on disk is always the raw representation.
    pub async fn save_to_project(&self, path: &str, payload: Payload) -> Result<()> {
        let raw = convert(payload, Representation::Raw).or_raise(|| ErrorKind::Conversion)?;
        let data = raw.as_raw().expect("converted to raw above");
        self.resolver
            .project()
            .write_to(ProjectScope::Archive, path, data)
            .await
            .or_raise(|| ErrorKind::Storage)?;
        self.cache.clear().await;
        Ok(())
    }

    /// Save text into the project `raw` scope.
    pub async fn save_to_raw(&self, path: &str, content: &str) -> Result<()> {
        self.resolver
            .project()
            .write_to(ProjectScope::Raw, path, content.as_bytes())
            .await
            .or_raise(|| ErrorKind::Storage)?;
        self.cache.clear().await;
        Ok(())
    }

    /// Save text into the project `resources` scope.
    pub async fn save_to_resources(&self, path: &str, content: &str) -> Result<()> {
        self.resolver
            .project()
            .write_to(ProjectScope::Resources, path, content.as_bytes())
            .await
            .or_raise(|| ErrorKind::Storage)?;
        self.cache.clear().await;
        Ok(())
    }

    /// Load a text file from the project `resources` scope.
    pub async fn load_from_resources(&self, path: &str) -> Result<Option<String>> {
        let Some(data) =
            self.resolver.project().fetch_from(ProjectScope::Resources, path).await.or_raise(|| ErrorKind::Storage)?
        else {
            return Ok(None);
        };
        Ok(Some(String::from_utf8(data).or_raise(|| ErrorKind::Conversion)?))
    }

    /// Delete a file from a project scope, returning whether it existed.
    pub async fn delete_file(&self, path: &str, scope: ProjectScope) -> Result<bool> {
        let existed = self.resolver.project().delete_from(scope, path).await.or_raise(|| ErrorKind::Storage)?;
        self.cache.clear().await;
        Ok(existed)
    }

    // ---- export ----------------------------------------------------------

    /// Export a list of files from the archive base into the project.
    ///
    /// Outcomes are per item, in request order; a failing item never
    /// aborts its siblings.
    pub async fn export_files(
        &self,
        identifiers: &[FileIdentifier],
        settings: Option<ExportSettings>,
    ) -> Vec<(FileIdentifier, ExportOutcome)> {
        let outcomes = export::export_all(&self.resolver, identifiers, &settings.unwrap_or_default()).await;
        self.cache.clear().await;
        outcomes
    }

    /// Extract a single file from the archive base into the project
    /// mirror.
    pub async fn extract(&self, path: &str) -> ExportOutcome {
        let ids = [FileIdentifier::from(path)];
        let mut outcomes = self.export_files(&ids, None).await;
        outcomes.pop().expect("one outcome per identifier").1
    }

    /// Drop every memoized existence lookup.
    pub async fn clear_export_file_lookup(&self) {
        self.cache.clear().await;
    }

    // ---- hashing ---------------------------------------------------------

    /// Hash a string with the named method (`"default"` or `"fnv1a64"`).
    ///
    /// The string is hashed exactly as given — this is the generic
    /// primitive scripts use for TweakDB ids as well as paths. An unknown
    /// method name yields `None`.
    pub fn hash_string(&self, data: &str, method: &str) -> Option<u64> {
        let method = method.parse::<HashMethod>().ok()?;
        Some(hash_str(data, method))
    }

    /// Reverse a default path hash into its canonical path, if this
    /// session's archive metadata knows it.
    pub fn get_path_from_hash(&self, hash: u64) -> Option<&str> {
        self.resolver.registry().path_for(hash)
    }

    // ---- conversion helpers ---------------------------------------------

    /// JSON representation of an already-loaded game file.
    pub fn game_file_to_json(&self, file: &GameFile) -> Result<String> {
        let json = convert(file.payload.clone(), Representation::Json).or_raise(|| ErrorKind::Conversion)?;
        Ok(json.as_json().expect("converted to json above").to_string())
    }

    /// A fresh instance of a named class, as JSON.
    pub fn create_instance_as_json(&self, class: &str) -> Result<String> {
        resource::to_json_string(&Resource::new(class)).or_raise(|| ErrorKind::Conversion)
    }

    /// Convert a YAML document to JSON text.
    pub fn yaml_to_json(&self, yaml: &str) -> Result<String> {
        resource::yaml_to_json(yaml).or_raise(|| ErrorKind::Conversion)
    }

    /// Convert JSON text to a YAML document.
    pub fn json_to_yaml(&self, json: &str) -> Result<String> {
        resource::json_to_yaml(json).or_raise(|| ErrorKind::Conversion)
    }

    /// Swap the extension of a path string.
    pub fn change_extension(&self, path: &str, extension: &str) -> String {
        change_extension(path, extension)
    }

    // ---- TweakDB ---------------------------------------------------------

    pub fn get_records(&self) -> Vec<String> {
        self.tweakdb.records()
    }

    pub fn get_flats(&self) -> Vec<String> {
        self.tweakdb.flats()
    }

    pub fn get_queries(&self) -> Vec<String> {
        self.tweakdb.queries()
    }

    pub fn get_group_tags(&self) -> Vec<String> {
        self.tweakdb.group_tags()
    }

    pub fn get_record(&self, path: &str) -> Option<&str> {
        self.tweakdb.record(path)
    }

    pub fn get_flat(&self, path: &str) -> Option<&str> {
        self.tweakdb.flat(path)
    }

    pub fn get_query(&self, path: &str) -> Vec<String> {
        self.tweakdb.query(path)
    }

    pub fn get_group_tag(&self, path: &str) -> Option<u8> {
        self.tweakdb.group_tag(path)
    }

    pub fn has_tdbid(&self, path: &str) -> bool {
        self.tweakdb.has_tdbid(path)
    }

    pub fn get_tdbid_path(&self, key: u64) -> Option<&str> {
        self.tweakdb.path_for_key(key)
    }

    // ---- deprecated script aliases --------------------------------------

    /// Raw game file from the archive base.
    #[deprecated(note = "use get_file_from_archive with an explicit representation")]
    pub async fn get_file_from_base(&self, identifier: impl Into<FileIdentifier>) -> Result<Option<GameFile>> {
        self.get_file_from_archive(identifier, Representation::Raw).await
    }

    /// Project-scoped load under its old script name.
    #[deprecated(note = "use get_file_from_project")]
    pub async fn load_game_file_from_project(
        &self,
        path: &str,
        representation: Representation,
    ) -> Result<Option<GameFile>> {
        self.get_file_from_project(path, representation).await
    }

    /// Parse a resource out of its JSON form.
    #[deprecated(note = "use depot_resource::convert")]
    pub fn json_to_resource(&self, json: &str) -> Result<Resource> {
        let payload = convert(Payload::Json(json.to_string()), Representation::Resource)
            .or_raise(|| ErrorKind::Conversion)?;
        Ok(payload.as_resource().expect("converted to resource above").clone())
    }
}
