//! Per-evaluation fact cache.
//!
//! Maps a fact id to the most recently fetched [`Fact`], or to an explicit
//! tombstone once a freshness check finds the entry stale. There is no
//! background sweeper: staleness is detected lazily at read time, which
//! trades a little memory (stale entries linger until the next read) for a
//! much simpler lifecycle. One evaluation owns the cache at a time; callers
//! that reuse a cache across rule firings keep it alive themselves.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::error::EngineError;
use crate::fact::Fact;

enum CacheEntry {
    Live(Fact),
    /// Left behind by a failed freshness check so a refetch can refill the
    /// slot without tripping the duplicate-fact error.
    Expired,
}

/// Store of already-fetched facts, keyed by fact id.
#[derive(Default)]
pub struct FactCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl FactCache {
    pub fn new() -> Self {
        FactCache::default()
    }

    /// Insert a freshly fetched fact.
    ///
    /// Fails with [`EngineError::DuplicateFact`] when a live entry already
    /// holds this fact id; refilling a tombstoned or absent slot succeeds.
    pub fn insert(&mut self, fact: Fact) -> Result<(), EngineError> {
        if let Some(CacheEntry::Live(_)) = self.entries.get(&fact.fact_id) {
            return Err(EngineError::DuplicateFact {
                fact_id: fact.fact_id.clone(),
            });
        }
        self.entries
            .insert(fact.fact_id.clone(), CacheEntry::Live(fact));
        Ok(())
    }

    /// Insert a batch of fetched facts, stopping at the first collision.
    pub fn insert_range(
        &mut self,
        facts: impl IntoIterator<Item = Fact>,
    ) -> Result<(), EngineError> {
        for fact in facts {
            self.insert(fact)?;
        }
        Ok(())
    }

    /// Whether a live entry for `fact_id` is still valid at `now`.
    ///
    /// Side effect: an entry that fails the time check is replaced by a
    /// tombstone (not removed), so the stale value is reported as a normal
    /// miss exactly once and the next insert for the id succeeds.
    pub fn is_fresh(&mut self, fact_id: &str, now: OffsetDateTime) -> bool {
        let stale = match self.entries.get(fact_id) {
            Some(CacheEntry::Live(fact)) => {
                if fact.valid_until >= now {
                    return true;
                }
                true
            }
            Some(CacheEntry::Expired) | None => false,
        };

        if stale {
            tracing::trace!(fact_id, "stale fact tombstoned in cache");
            self.entries
                .insert(fact_id.to_string(), CacheEntry::Expired);
        }
        false
    }

    /// The live fact for `fact_id`, if any. Tombstoned slots read as absent.
    pub fn get(&self, fact_id: &str) -> Option<&Fact> {
        match self.entries.get(fact_id) {
            Some(CacheEntry::Live(fact)) => Some(fact),
            _ => None,
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
