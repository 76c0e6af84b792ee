//! Recent-collision ledger.
//!
//! Owned by exactly one weapon or hazard. Within one activation window a
//! `(group, target)` pair is credited at most once; the owner clears the
//! ledger when a new window opens.

use ahash::AHashSet;
use brawl_common::{CollisionGroup, EntityId};

/// Already-hit targets of the current activation window.
#[derive(Debug, Clone, Default)]
pub struct RecentCollisionLedger {
    hits: AHashSet<(CollisionGroup, EntityId)>,
}

impl RecentCollisionLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the target was already credited in this group.
    #[must_use]
    pub fn contains(&self, group: CollisionGroup, target: EntityId) -> bool {
        self.hits.contains(&(group, target))
    }

    /// Records a hit. Returns false if it was already present.
    pub fn insert(&mut self, group: CollisionGroup, target: EntityId) -> bool {
        self.hits.insert((group, target))
    }

    /// Opens a fresh activation window.
    pub fn clear(&mut self) {
        self.hits.clear();
    }

    /// Number of recorded pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
