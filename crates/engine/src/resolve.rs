//! Dual-tier resolution.
//!
//! One algorithm serves every lookup on the scripting surface: normalize
//! the identifier, walk the tiers the caller scoped the query to (project
//! before archive), and materialize the first hit in the requested
//! representation. The project overlay always shadows the archive base
//! for the same identity — saving a file into the project masks the
//! archive's copy without mutating it.

use exn::ResultExt;
use std::sync::Arc;

use crate::error::{ErrorKind, Result};
use depot_identity::{FileIdentifier, Identity, IdentityRegistry};
use depot_resource::{Payload, Representation, convert};
use depot_storage::{ArchiveStore, ProjectStore, Store, Tier};

/// Which tiers a lookup may consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierScope {
    /// Project overlay only.
    Project,
    /// Archive base only.
    Archive,
    /// Project first, archive as fallback.
    Either,
}

/// A resolved file: identification plus the payload in the representation
/// the caller asked for. An owned copy; dropping it touches nothing in
/// either tier.
#[derive(Debug, Clone, PartialEq)]
pub struct GameFile {
    /// File name without extension (or the hash in hex, for an identity
    /// no path is known for).
    pub name: String,
    /// Extension without the dot; empty if none.
    pub extension: String,
    pub payload: Payload,
}

impl GameFile {
    fn new(identity: &Identity, payload: Payload) -> Self {
        let (name, extension) = match identity.path() {
            Some(path) => {
                let file = path.rsplit('/').next().unwrap_or(path);
                match file.rsplit_once('.') {
                    Some((stem, ext)) => (stem.to_string(), ext.to_string()),
                    None => (file.to_string(), String::new()),
                }
            },
            None => (format!("{:016x}", identity.hash), String::new()),
        };
        Self { name, extension, payload }
    }
}

/// Composes the identity registry with both storage tiers.
pub struct Resolver {
    registry: IdentityRegistry,
    project: Arc<ProjectStore>,
    archive: Arc<ArchiveStore>,
}

impl Resolver {
    pub fn new(registry: IdentityRegistry, project: Arc<ProjectStore>, archive: Arc<ArchiveStore>) -> Self {
        Self { registry, project, archive }
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn project(&self) -> &ProjectStore {
        &self.project
    }

    pub fn archive(&self) -> &ArchiveStore {
        &self.archive
    }

    /// Normalize a tagged identifier against the registry.
    pub fn identity(&self, identifier: &FileIdentifier) -> Result<Identity> {
        self.registry.resolve(identifier).or_raise(|| ErrorKind::Identity)
    }

    /// Tiers to consult, in precedence order.
    fn stores(&self, scope: TierScope) -> Vec<&dyn Store> {
        match scope {
            TierScope::Project => vec![self.project.as_ref()],
            TierScope::Archive => vec![self.archive.as_ref()],
            TierScope::Either => vec![self.project.as_ref(), self.archive.as_ref()],
        }
    }

    /// Which tier (if any) holds the identity, without fetching content.
    pub async fn locate(&self, identity: &Identity, scope: TierScope) -> Result<Option<Tier>> {
        for store in self.stores(scope) {
            if store.exists(identity).await.or_raise(|| ErrorKind::Storage)? {
                return Ok(Some(store.tier()));
            }
        }
        Ok(None)
    }

    /// Fetch raw bytes from the first tier holding the identity.
    pub async fn fetch(&self, identity: &Identity, scope: TierScope) -> Result<Option<(Tier, Vec<u8>)>> {
        for store in self.stores(scope) {
            if let Some(data) = store.fetch(identity).await.or_raise(|| ErrorKind::Storage)? {
                return Ok(Some((store.tier(), data)));
            }
        }
        Ok(None)
    }

    /// Resolve an identifier to a [`GameFile`] in the requested
    /// representation. A miss in every consulted tier is `Ok(None)`.
    pub async fn resolve(
        &self,
        identifier: &FileIdentifier,
        representation: Representation,
        scope: TierScope,
    ) -> Result<Option<GameFile>> {
        let identity = self.identity(identifier)?;
        let Some((tier, data)) = self.fetch(&identity, scope).await? else {
            return Ok(None);
        };
        tracing::debug!(identifier = %identifier, %tier, %representation, "resolved");
        let payload = convert(Payload::Raw(data), representation).or_raise(|| ErrorKind::Conversion)?;
        Ok(Some(GameFile::new(&identity, payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_resource::{Resource, Value, encode};
    use depot_storage::PackBuilder;

    async fn resolver(archive_files: &[(&str, Vec<u8>)]) -> (tempfile::TempDir, Resolver) {
        let dir = tempfile::tempdir().unwrap();
        let project = Arc::new(ProjectStore::new(dir.path()).unwrap());
        let mut builder = PackBuilder::new();
        for (path, data) in archive_files {
            builder = builder.add(path, data.clone()).unwrap();
        }
        let archive = Arc::new(ArchiveStore::from_bytes(builder.build().unwrap()).await.unwrap());
        let mut registry = IdentityRegistry::new();
        for (path, _) in archive.entries() {
            registry.register(path).unwrap();
        }
        (dir, Resolver::new(registry, project, archive))
    }

    fn entity() -> Vec<u8> {
        encode(&Resource::new("entEntityTemplate").with_prop("visible", Value::Bool(true)))
    }

    #[tokio::test]
    async fn test_archive_fallback() {
        let (_dir, resolver) = resolver(&[("a/b.ent", entity())]).await;
        let id = FileIdentifier::from("a/b.ent");
        let file = resolver.resolve(&id, Representation::Raw, TierScope::Either).await.unwrap().unwrap();
        assert_eq!(file.name, "b");
        assert_eq!(file.extension, "ent");
        assert_eq!(file.payload.as_raw(), Some(&entity()[..]));
    }

    #[tokio::test]
    async fn test_project_shadows_archive() {
        let (_dir, resolver) = resolver(&[("a/b.ent", b"archive copy".to_vec())]).await;
        let identity = resolver.identity(&FileIdentifier::from("a/b.ent")).unwrap();
        resolver.project().write(&identity, b"project copy").await.unwrap();

        let combined = resolver.fetch(&identity, TierScope::Either).await.unwrap().unwrap();
        assert_eq!(combined, (Tier::Project, b"project copy".to_vec()));
        // The archive copy is untouched and still reachable when scoped.
        let scoped = resolver.fetch(&identity, TierScope::Archive).await.unwrap().unwrap();
        assert_eq!(scoped, (Tier::Archive, b"archive copy".to_vec()));
    }

    #[tokio::test]
    async fn test_miss_is_none_not_error() {
        let (_dir, resolver) = resolver(&[]).await;
        let id = FileIdentifier::from("never/exists.ent");
        assert_eq!(resolver.resolve(&id, Representation::Raw, TierScope::Either).await.unwrap(), None);
        let identity = resolver.identity(&id).unwrap();
        assert_eq!(resolver.locate(&identity, TierScope::Either).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_by_hash() {
        let (_dir, resolver) = resolver(&[("a/b.ent", entity())]).await;
        let hash = resolver.registry().hash_for("a/b.ent", depot_identity::HashMethod::Default).unwrap();
        let file = resolver
            .resolve(&FileIdentifier::from(hash), Representation::Resource, TierScope::Either)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(file.payload.as_resource().unwrap().class, "entEntityTemplate");
    }

    #[tokio::test]
    async fn test_scoped_lookup_ignores_other_tier() {
        let (_dir, resolver) = resolver(&[("a/b.ent", entity())]).await;
        let identity = resolver.identity(&FileIdentifier::from("a/b.ent")).unwrap();
        assert_eq!(resolver.locate(&identity, TierScope::Project).await.unwrap(), None);
        assert_eq!(resolver.locate(&identity, TierScope::Archive).await.unwrap(), Some(Tier::Archive));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_conversion_error() {
        let (_dir, resolver) = resolver(&[("a/b.ent", b"not a resource".to_vec())]).await;
        let id = FileIdentifier::from("a/b.ent");
        let err = resolver.resolve(&id, Representation::Json, TierScope::Either).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conversion));
    }
}
