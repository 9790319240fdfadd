//! Asset resolution and export for the depot modding toolchain.
//!
//! This crate is the bridge scripts talk to: it locates game resource
//! files by path or 64-bit hash across the two storage tiers (mutable
//! project overlay, immutable archive base), materializes them as raw
//! bytes, structured resources or JSON, and batch-exports archive content
//! into the project.
//!
//! # Architecture
//! - [`Resolver`] composes the identity registry with both tiers and owns
//!   the precedence rule: project shadows archive.
//! - [`LookupCache`] memoizes existence checks and is invalidated
//!   wholesale on every engine-visible mutation.
//! - [`export`](Session::export_files) reads the authoritative archive
//!   tier and reports per-item outcomes.
//! - [`TweakDb`] is the separate flat key-value namespace with its own
//!   TDBID bijection.
//! - [`Session`] owns all of the above, one instance per embedding.

mod cache;
pub mod error;
mod export;
mod resolve;
mod session;
mod tweakdb;

pub use crate::cache::LookupCache;
pub use crate::export::{ExportFormat, ExportOutcome, ExportSettings};
pub use crate::resolve::{GameFile, Resolver, TierScope};
pub use crate::session::Session;
pub use crate::tweakdb::TweakDb;

// The engine's vocabulary re-exported for embedders, so scripts bindings
// only need this crate.
pub use depot_identity::{FileIdentifier, HashMethod};
pub use depot_resource::{Payload, Representation, Resource, Value};
pub use depot_storage::{ProjectScope, Tier};
