//! File identity for the depot toolchain.
//!
//! Game files are addressed two ways: by a human-readable resource path or
//! by a stable 64-bit hash of that path. This crate owns everything about
//! that duality:
//! - the canonical path form every other crate compares against,
//! - the two hashing methods exposed to scripts (`default` and `fnv1a64`),
//! - the session-lifetime [`IdentityRegistry`] mapping hashes back to paths.
//!
//! Hashing is pure: no I/O, no dependence on what any store currently
//! contains. An unknown hash is a normal outcome (`None`), never a fault.

pub mod error;
mod fnv;
mod ident;
mod path;
mod registry;

pub use crate::fnv::{FNV_OFFSET_BASIS, FNV_PRIME, fnv1a64};
pub use crate::ident::{FileIdentifier, Identity};
pub use crate::path::{canonicalize, change_extension};
pub use crate::registry::{HashMethod, IdentityRegistry, hash_path, hash_str};
