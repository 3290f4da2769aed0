//! Satisfaction engine: fact acquisition, condition evaluation, and rule
//! dispatch.
//!
//! One evaluation discovers the facts a condition tree requires, fetches the
//! missing or expired ones concurrently (fan-out per distinct fact id,
//! fan-in before anything else proceeds), merges them into the caller's
//! cache, and runs a scoped [`EvaluationSession`] over the tree. Fetch
//! failures surface per identity and never cancel sibling fetches.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::FactCache;
use crate::clock::EngineClock;
use crate::condition::{Condition, SatisfactionStatus};
use crate::error::EngineError;
use crate::registry::FactSourceRegistry;
use crate::rule::{Rule, RuleEvaluationResult};
use crate::session::EvaluationSession;
use crate::source::SourceError;

/// Orchestrates fact fetching and condition/rule evaluation.
pub struct SatisfactionEngine {
    registry: Arc<FactSourceRegistry>,
    clock: Arc<dyn EngineClock>,
    fetch_timeout: Option<Duration>,
}

impl SatisfactionEngine {
    pub fn new(registry: Arc<FactSourceRegistry>, clock: Arc<dyn EngineClock>) -> Self {
        SatisfactionEngine {
            registry,
            clock,
            fetch_timeout: None,
        }
    }

    /// Bound every individual fact fetch by `timeout`. A producer that does
    /// not complete in time fails its identity with a timeout cause; other
    /// in-flight fetches are unaffected.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Evaluate a condition tree, fetching whatever facts it requires that
    /// the cache does not hold fresh.
    ///
    /// The result is always definite: an overall `Unknown` after every
    /// required fact was bound means a leaf is not wired to the fact it
    /// declared, and surfaces as [`EngineError::IndeterminateResult`].
    pub async fn evaluate_condition(
        &self,
        condition: &dyn Condition,
        cache: &mut FactCache,
    ) -> Result<SatisfactionStatus, EngineError> {
        let required = condition.required_fact_ids()?.to_vec();
        self.refresh_facts(&required, cache).await?;

        let session = EvaluationSession::open(condition, cache)?;
        let status = session.evaluate()?;
        drop(session);

        if status == SatisfactionStatus::Unknown {
            return Err(EngineError::IndeterminateResult);
        }
        Ok(status)
    }

    /// Evaluate a rule: run its condition, and when satisfied resolve the
    /// declared fact parameters and invoke the handler with the bound facts
    /// in declared order.
    pub async fn evaluate_rule(
        &self,
        rule: &dyn Rule,
        cache: &mut FactCache,
    ) -> Result<RuleEvaluationResult, EngineError> {
        let status = self.evaluate_condition(rule.condition(), cache).await?;
        if !status.is_satisfied() {
            return Ok(RuleEvaluationResult::NotEvaluated);
        }

        let params = rule.fact_params();
        let mut distinct: Vec<String> = Vec::new();
        for fact_id in &params {
            if !distinct.contains(fact_id) {
                distinct.push(fact_id.clone());
            }
        }
        self.refresh_facts(&distinct, cache).await?;

        let mut facts = Vec::with_capacity(params.len());
        for fact_id in &params {
            let fact = cache
                .get(fact_id)
                .ok_or_else(|| EngineError::UnknownFact {
                    fact_id: fact_id.clone(),
                })?;
            facts.push(fact.clone());
        }

        tracing::debug!(priority = rule.priority(), "firing rule handler");
        rule.fire(&facts).await
    }

    /// Evaluate rules in priority order (higher first; ties keep slice
    /// order), stopping after a handler asks to.
    ///
    /// Returns the outcome of every rule attempted, in evaluation order.
    pub async fn evaluate_rules(
        &self,
        rules: &[Arc<dyn Rule>],
        cache: &mut FactCache,
    ) -> Result<Vec<RuleEvaluationResult>, EngineError> {
        let mut ordered: Vec<&Arc<dyn Rule>> = rules.iter().collect();
        ordered.sort_by_key(|rule| std::cmp::Reverse(rule.priority()));

        let mut outcomes = Vec::with_capacity(ordered.len());
        for rule in ordered {
            let outcome = self.evaluate_rule(rule.as_ref(), cache).await?;
            let stop = outcome == RuleEvaluationResult::StopEvaluation;
            outcomes.push(outcome);
            if stop {
                break;
            }
        }
        Ok(outcomes)
    }

    /// Fetch every id in `fact_ids` the cache does not hold fresh, all
    /// concurrently, and merge the results.
    ///
    /// Waits for every fetch before reporting anything: successful facts are
    /// inserted into the cache even when a sibling failed, then the first
    /// per-identity failure (in `fact_ids` order) is returned.
    async fn refresh_facts(
        &self,
        fact_ids: &[String],
        cache: &mut FactCache,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        let missing: Vec<String> = fact_ids
            .iter()
            .filter(|fact_id| !cache.is_fresh(fact_id, now))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = missing.len(), "fetching missing facts");

        let mut handles = Vec::with_capacity(missing.len());
        for fact_id in missing {
            let registry = Arc::clone(&self.registry);
            let fetch_timeout = self.fetch_timeout;
            let id = fact_id.clone();
            let handle = tokio::spawn(async move {
                match fetch_timeout {
                    Some(limit) => {
                        match tokio::time::timeout(limit, registry.request_fact(&fact_id)).await {
                            Ok(result) => result,
                            Err(_) => Err(EngineError::FactFetchFailed {
                                fact_id,
                                source: SourceError::Timeout { limit },
                            }),
                        }
                    }
                    None => registry.request_fact(&fact_id).await,
                }
            });
            handles.push((id, handle));
        }

        let mut first_error = None;
        for (fact_id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(EngineError::FactFetchFailed {
                    fact_id: fact_id.clone(),
                    source: SourceError::Canceled {
                        reason: join_error.to_string(),
                    },
                }),
            };
            match result {
                Ok(fact) => cache.insert(fact)?,
                Err(error) => {
                    tracing::warn!(%fact_id, %error, "fact fetch failed");
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
