//! Storage tiers for the depot toolchain.
//!
//! A file can live in two places:
//! - the **project** overlay: a mutable working directory partitioned into
//!   `archive`/`raw`/`resources` scopes, where mod work-in-progress lands;
//! - the **archive** base: the game's packed content, loaded once at
//!   startup and immutable for the whole session.
//!
//! Both implement the [`Store`] trait for the read side; only the project
//! tier accepts mutation. The resolution engine layered on top gives the
//! project tier precedence, so a file saved into the overlay masks the
//! archive's copy without ever touching it.

pub mod error;
pub mod pack;
mod scope;
mod tier;

pub use crate::pack::PackBuilder;
pub use crate::scope::ProjectScope;
pub use crate::tier::{ArchiveStore, PathStream, ProjectStore, Store, Tier};
