//! The mutable project overlay.
//!
//! A local directory partitioned into the three [`ProjectScope`] folders.
//! All paths are canonical resource paths relative to a scope root; the
//! canonical form already forbids traversal, so joining is safe.

use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use futures::TryStreamExt;
use std::fs::create_dir_all as sync_create_dir_all;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{ErrorKind, Result};
use crate::scope::ProjectScope;
use crate::tier::{PathStream, Store, Tier};
use depot_identity::{Identity, canonicalize};

/// Mutable, scoped filesystem store for the mod project.
///
/// The `archive` scope mirrors the game-file namespace and is what the
/// [`Store`] trait view addresses; `raw` and `resources` are reachable
/// through the scoped inherent methods only.
///
/// # Examples
///
/// ```no_run
/// use depot_storage::{ProjectScope, ProjectStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let project = ProjectStore::new("/path/to/mod-project")?;
/// project.write_to(ProjectScope::Raw, "notes/readme.json", b"{}").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    /// Create a store rooted at an absolute directory, creating the root
    /// and its scope folders if missing.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root.display().to_string()));
        }
        // Non-async on purpose; this happens once when the session opens
        // and a sync call keeps the constructor callable anywhere.
        for scope in ProjectScope::ALL {
            sync_create_dir_all(root.join(scope.dir_name())).map_err(ErrorKind::Io)?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonicalize and anchor a resource path under a scope folder.
    fn file_path(&self, scope: ProjectScope, path: &str) -> Result<PathBuf> {
        let canonical = canonicalize(path).or_raise(|| ErrorKind::InvalidPath(path.to_string()))?;
        Ok(self.root.join(scope.dir_name()).join(canonical))
    }

    pub async fn exists_in(&self, scope: ProjectScope, path: &str) -> Result<bool> {
        let abs = self.file_path(scope, path)?;
        Ok(fs::try_exists(&abs).await.map_err(ErrorKind::Io)?)
    }

    /// Read a file from a scope. `Ok(None)` on a miss.
    pub async fn fetch_from(&self, scope: ProjectScope, path: &str) -> Result<Option<Vec<u8>>> {
        let abs = self.file_path(scope, path)?;
        match fs::read(&abs).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(exn::Exn::from(ErrorKind::Io(err))),
        }
    }

    /// Write a file into a scope, atomically.
    ///
    /// Data lands in a sibling temp file first and is renamed into place,
    /// so no reader can observe a partial write. Parent directories are
    /// created as needed.
    pub async fn write_to(&self, scope: ProjectScope, path: &str, data: &[u8]) -> Result<()> {
        let abs = self.file_path(scope, path)?;
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).await.map_err(ErrorKind::Io)?;
        }
        // Same directory as the destination: rename must not cross a
        // filesystem boundary or it stops being atomic.
        let mut tmp = abs.clone().into_os_string();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, data).await.map_err(ErrorKind::Io)?;
        if let Err(err) = fs::rename(&tmp, &abs).await {
            _ = fs::remove_file(&tmp).await;
            exn::bail!(ErrorKind::Io(err));
        }
        tracing::debug!(scope = %scope, path, bytes = data.len(), "wrote project file");
        Ok(())
    }

    /// Delete a file from a scope, returning whether it existed.
    pub async fn delete_from(&self, scope: ProjectScope, path: &str) -> Result<bool> {
        let abs = self.file_path(scope, path)?;
        match fs::remove_file(&abs).await {
            Ok(()) => {
                tracing::debug!(scope = %scope, path, "deleted project file");
                Ok(true)
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(exn::Exn::from(ErrorKind::Io(err))),
        }
    }

    /// Stream the canonical paths of every file under a scope.
    ///
    /// Enumeration order is unspecified. A scope folder that has gone
    /// missing yields an empty stream rather than an error.
    pub fn list_stream(&self, scope: ProjectScope) -> PathStream<'_> {
        let scope_root = self.root.join(scope.dir_name());
        Box::pin(stream! {
            let mut stack = vec![scope_root.clone()];
            while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(ErrorKind::Io(err)));
                        continue;
                    },
                };
                loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break,
                        Err(err) => {
                            yield Err(exn::Exn::from(ErrorKind::Io(err)));
                            continue;
                        },
                    };
                    let path = entry.path();
                    let file_type = match entry.file_type().await {
                        Ok(file_type) => file_type,
                        Err(err) => {
                            yield Err(exn::Exn::from(ErrorKind::Io(err)));
                            continue;
                        },
                    };
                    if file_type.is_dir() {
                        stack.push(path);
                        continue;
                    }
                    if !file_type.is_file() {
                        // Most likely a broken symlink; drop it.
                        continue;
                    }
                    match path.strip_prefix(&scope_root).ok().and_then(Path::to_str) {
                        Some(relative) => yield Ok(relative.replace(std::path::MAIN_SEPARATOR, "/")),
                        None => tracing::warn!(path = %path.display(), "skipping non-UTF8 project path"),
                    }
                }
            }
        })
    }

    /// Collect [`list_stream`](Self::list_stream) into a `Vec`.
    pub async fn list(&self, scope: ProjectScope) -> Result<Vec<String>> {
        self.list_stream(scope).try_collect().await
    }
}

#[async_trait]
impl Store for ProjectStore {
    fn name(&self) -> &str {
        "project"
    }

    fn tier(&self) -> Tier {
        Tier::Project
    }

    async fn exists(&self, id: &Identity) -> Result<bool> {
        match id.path() {
            Some(path) => self.exists_in(ProjectScope::Archive, path).await,
            // A hash the registry cannot name has no location here.
            None => Ok(false),
        }
    }

    async fn fetch(&self, id: &Identity) -> Result<Option<Vec<u8>>> {
        match id.path() {
            Some(path) => self.fetch_from(ProjectScope::Archive, path).await,
            None => Ok(None),
        }
    }

    async fn write(&self, id: &Identity, data: &[u8]) -> Result<()> {
        match id.path() {
            Some(path) => self.write_to(ProjectScope::Archive, path, data).await,
            None => exn::bail!(ErrorKind::PathUnknown(id.hash)),
        }
    }

    async fn delete(&self, id: &Identity) -> Result<bool> {
        match id.path() {
            Some(path) => self.delete_from(ProjectScope::Archive, path).await,
            None => Ok(false),
        }
    }
}
