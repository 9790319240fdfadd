//! Batch export from the archive base into the project overlay.
//!
//! Export always reads the *archive* tier — the authoritative source —
//! even when the project holds a shadowing copy; re-exporting is how a
//! script gets back to vanilla content. Items are processed in the
//! caller's order and failures stay per-item: one malformed file in a
//! thousand-file batch costs exactly one outcome, not the batch.

use exn::ResultExt;
use serde::Deserialize;

use crate::error::{Error, ErrorKind};
use crate::resolve::{Resolver, TierScope};
use depot_identity::FileIdentifier;
use depot_resource::{Payload, Representation, convert};
use depot_storage::ProjectScope;

/// Where an exported file lands, and as what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Stored bytes as-is, into the project `archive` mirror under the
    /// source path.
    #[default]
    Raw,
    /// JSON conversion, into the project `raw` scope with `.json`
    /// appended to the source path.
    Json,
}

/// Caller-supplied batch settings; scripts pass these as a JSON object.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    pub format: ExportFormat,
    /// When `false`, an already-present destination is left alone and the
    /// item reports [`ExportOutcome::SkippedExisting`].
    pub overwrite: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { format: ExportFormat::default(), overwrite: true }
    }
}

/// Per-item result of a batch export.
#[derive(Debug)]
pub enum ExportOutcome {
    /// Written into the project at the given scope-relative path.
    Exported { scope: ProjectScope, path: String, bytes: usize },
    /// Not present in the archive base. A normal outcome, not a failure.
    NotFound,
    /// Destination already exists and overwriting was disabled.
    SkippedExisting { scope: ProjectScope, path: String },
    /// This item failed; siblings are unaffected.
    Failed(Error),
}

impl ExportOutcome {
    pub fn is_exported(&self) -> bool {
        matches!(self, Self::Exported { .. })
    }
}

/// Export a list of identifiers; outcomes come back in request order.
///
/// The caller (the session) is responsible for invalidating the lookup
/// cache after the batch.
pub(crate) async fn export_all(
    resolver: &Resolver,
    identifiers: &[FileIdentifier],
    settings: &ExportSettings,
) -> Vec<(FileIdentifier, ExportOutcome)> {
    let mut outcomes = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        let outcome = export_one(resolver, identifier, settings).await;
        if let ExportOutcome::Failed(err) = &outcome {
            tracing::warn!(identifier = %identifier, error = %err, "export item failed");
        }
        outcomes.push((identifier.clone(), outcome));
    }
    let exported = outcomes.iter().filter(|(_, outcome)| outcome.is_exported()).count();
    tracing::info!(requested = identifiers.len(), exported, "export batch finished");
    outcomes
}

async fn export_one(
    resolver: &Resolver,
    identifier: &FileIdentifier,
    settings: &ExportSettings,
) -> ExportOutcome {
    let identity = match resolver.identity(identifier) {
        Ok(identity) => identity,
        Err(err) => return ExportOutcome::Failed(err),
    };
    let data = match resolver.fetch(&identity, TierScope::Archive).await {
        Ok(Some((_, data))) => data,
        Ok(None) => return ExportOutcome::NotFound,
        Err(err) => return ExportOutcome::Failed(err),
    };
    let Some(source_path) = identity.path() else {
        // Seeded registries name every archive entry; a pathless hit means
        // the container and registry disagree.
        return ExportOutcome::Failed(exn::Exn::from(ErrorKind::Identity));
    };

    let (scope, path, payload) = match settings.format {
        ExportFormat::Raw => (ProjectScope::Archive, source_path.to_string(), Payload::Raw(data)),
        ExportFormat::Json => {
            let payload = match convert(Payload::Raw(data), Representation::Json)
                .or_raise(|| ErrorKind::Conversion)
            {
                Ok(payload) => payload,
                Err(err) => return ExportOutcome::Failed(err),
            };
            (ProjectScope::Raw, format!("{source_path}.json"), payload)
        },
    };

    if !settings.overwrite {
        match resolver.project().exists_in(scope, &path).await.or_raise(|| ErrorKind::Storage) {
            Ok(true) => return ExportOutcome::SkippedExisting { scope, path },
            Ok(false) => {},
            Err(err) => return ExportOutcome::Failed(err),
        }
    }

    let bytes = match payload {
        Payload::Raw(data) => data,
        Payload::Json(text) => text.into_bytes(),
        Payload::Resource(_) => unreachable!("export never materializes the resource representation"),
    };
    match resolver.project().write_to(scope, &path, &bytes).await.or_raise(|| ErrorKind::Storage) {
        Ok(()) => ExportOutcome::Exported { scope, path, bytes: bytes.len() },
        Err(err) => ExportOutcome::Failed(err),
    }
}
