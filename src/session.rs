//! Scoped evaluation session over a condition tree.
//!
//! Opening a session binds every fact the tree requires, pulled from the
//! cache tolerating absence, into a session-local [`BoundFacts`] table.
//! The table, not the tree, owns the bindings: dropping the session releases
//! every binding exactly once whether or not `evaluate` ran or erred, so a
//! tree never carries a stale binding into its next evaluation.

use std::collections::BTreeMap;

use crate::cache::FactCache;
use crate::condition::{Condition, SatisfactionStatus};
use crate::error::EngineError;
use crate::fact::Fact;

/// Session-local binding table from fact id to the fact bound for this
/// evaluation.
#[derive(Debug, Default)]
pub struct BoundFacts {
    facts: BTreeMap<String, Fact>,
}

impl BoundFacts {
    /// Bind a fact for the duration of the session holding this table.
    pub fn bind(&mut self, fact: Fact) {
        self.facts.insert(fact.fact_id.clone(), fact);
    }

    /// The fact bound under `fact_id`, if one was available at open time.
    pub fn get(&self, fact_id: &str) -> Option<&Fact> {
        self.facts.get(fact_id)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// One evaluation pass over a condition tree.
pub struct EvaluationSession<'a> {
    condition: &'a dyn Condition,
    bound: BoundFacts,
}

impl<'a> EvaluationSession<'a> {
    /// Bind every required fact available in the cache. A fact the cache
    /// does not hold (producer failed, or its policy has not run) is left
    /// unbound; the dependent leaves evaluate to `Unknown`.
    pub fn open(condition: &'a dyn Condition, cache: &FactCache) -> Result<Self, EngineError> {
        let mut bound = BoundFacts::default();
        for fact_id in condition.required_fact_ids()? {
            if let Some(fact) = cache.get(fact_id) {
                bound.bind(fact.clone());
            }
        }
        Ok(EvaluationSession { condition, bound })
    }

    /// Evaluate the tree's root against this session's bindings.
    pub fn evaluate(&self) -> Result<SatisfactionStatus, EngineError> {
        self.condition.satisfaction(&self.bound)
    }

    pub fn bound_facts(&self) -> &BoundFacts {
        &self.bound
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
