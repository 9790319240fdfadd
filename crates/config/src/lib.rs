//! Configuration loading for depot.
//!
//! A session needs three things: where the mutable project lives, which
//! archive containers make up the base content, and (optionally) a
//! TweakDB snapshot. Configuration is layered: a TOML file, overridden by
//! `DEPOT_`-prefixed environment variables.

pub mod error;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};

const ENV_PREFIX: &str = "DEPOT_";
const CONFIG_FILE: &str = "depot.toml";

/// Session configuration.
///
/// ```toml
/// project_root = "/home/me/mods/my-mod"
/// archives = ["/games/base/content0.dpk", "/games/base/content1.dpk"]
/// tweakdb = "/games/base/tweakdb.json"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DepotConfig {
    /// Root directory of the mutable project overlay.
    pub project_root: PathBuf,
    /// Archive containers, consulted in order.
    #[serde(default)]
    pub archives: Vec<PathBuf>,
    /// Optional TweakDB snapshot (JSON).
    #[serde(default)]
    pub tweakdb: Option<PathBuf>,
}

impl DepotConfig {
    /// Load from the platform config directory
    /// (`…/depot/depot.toml`), overridden by environment variables.
    pub fn load() -> Result<Self> {
        let file = directories::ProjectDirs::from("", "", "depot")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE));
        Self::extract(file.as_deref())
    }

    /// Load from an explicit file, overridden by environment variables.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::extract(Some(path.as_ref()))
    }

    fn extract(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|err| exn::Exn::from(ErrorKind::Load(err.to_string())))?;
        if !config.project_root.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!(
                "project_root must be absolute, got {:?}",
                config.project_root
            )));
        }
        tracing::debug!(
            project_root = %config.project_root.display(),
            archives = config.archives.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}
