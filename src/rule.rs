//! Rule capability: a priority-ordered condition plus a handler.
//!
//! A rule declares the facts its handler consumes as an explicit, ordered
//! parameter table ([`Rule::fact_params`]); the engine resolves them against
//! the cache and invokes [`Rule::fire`] with the bound facts in declared
//! order once the rule's condition is satisfied. The handler is a single
//! async entry point; a synchronous handler simply returns without
//! awaiting anything.

use async_trait::async_trait;

use crate::condition::Condition;
use crate::error::EngineError;
use crate::fact::Fact;

/// What the engine should do after attempting one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleEvaluationResult {
    /// The rule's condition was not satisfied; the handler never ran.
    NotEvaluated,
    /// The handler ran; keep evaluating further rules.
    EvaluateNext,
    /// The handler ran and the chain should stop here.
    StopEvaluation,
}

/// A condition-gated handler over named facts.
#[async_trait]
pub trait Rule: Send + Sync {
    /// Chain ordering: higher priorities are evaluated first. Ties keep
    /// declaration order.
    fn priority(&self) -> i32 {
        0
    }

    /// The condition gating this rule's handler.
    fn condition(&self) -> &dyn Condition;

    /// Fact ids the handler consumes, in the order `fire` expects them.
    fn fact_params(&self) -> Vec<String> {
        Vec::new()
    }

    /// The handler. `facts` holds the bound facts matching `fact_params`
    /// positionally; read payloads with [`Fact::data`].
    async fn fire(&self, facts: &[Fact]) -> Result<RuleEvaluationResult, EngineError>;
}
