//! Export-lookup memoization.
//!
//! Existence checks dominate export-time scripting (thousands of "is this
//! already in the project?" probes), so located-tier results are memoized
//! per `(hash, scope)`. Invalidation is deliberately blunt: any mutation
//! the engine can see drops the whole map. Tier content can also change
//! through paths the engine never observes (direct filesystem writes); a
//! cache made stale that way is an accepted limitation, which is exactly
//! why there is no fine-grained invalidation to get wrong.

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::resolve::TierScope;
use depot_storage::Tier;

/// Memo of [`Resolver::locate`](crate::Resolver::locate) results.
///
/// The `RwLock` serializes the clearing writer against readers, so a
/// lookup never observes a half-invalidated map.
#[derive(Debug, Default)]
pub struct LookupCache {
    entries: RwLock<HashMap<(u64, TierScope), Option<Tier>>>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached located-tier for a query, if any. The outer `Option` is the
    /// cache hit; the inner one is the memoized answer (`None` = known
    /// absent).
    pub async fn get(&self, hash: u64, scope: TierScope) -> Option<Option<Tier>> {
        self.entries.read().await.get(&(hash, scope)).copied()
    }

    pub async fn put(&self, hash: u64, scope: TierScope, located: Option<Tier>) {
        self.entries.write().await.insert((hash, scope), located);
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "cleared export lookup cache");
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
