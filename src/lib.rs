//! Factum -- fact-driven condition evaluation and rule dispatch.
//!
//! The engine evaluates boolean condition trees over externally-sourced,
//! time-limited facts (machine identity, current time, network address) and
//! dispatches rule handlers bound to specific facts by name once a tree is
//! satisfied.
//!
//! The pipeline for one evaluation:
//! 1. The condition tree reports the fact ids it requires.
//! 2. The [`FactCache`] answers which of them are still fresh against the
//!    injected [`EngineClock`]; stale entries are tombstoned in place.
//! 3. Missing ids are fetched concurrently from the [`FactSourceRegistry`]
//!    and merged into the cache.
//! 4. A scoped [`EvaluationSession`] binds the facts onto the tree's leaves,
//!    reads the tri-state [`SatisfactionStatus`], and releases every binding
//!    on drop.
//!
//! Everything is in-process; there is no wire protocol, no persistence, and
//! no background work. Facts live exactly as long as their producer's
//! time-to-live says they should.

pub mod builtin;
pub mod cache;
pub mod clock;
pub mod condition;
pub mod engine;
pub mod error;
pub mod fact;
pub mod registry;
pub mod rule;
pub mod session;
pub mod source;

pub use cache::FactCache;
pub use clock::{EngineClock, FixedClock, SystemClock};
pub use condition::{
    AndCondition, Condition, ConditionProperties, FactCondition, LeafCondition, OrCondition,
    SatisfactionStatus,
};
pub use engine::SatisfactionEngine;
pub use error::EngineError;
pub use fact::{Fact, FactData};
pub use registry::FactSourceRegistry;
pub use rule::{Rule, RuleEvaluationResult};
pub use session::{BoundFacts, EvaluationSession};
pub use source::{
    ActivationPolicy, FactSource, FactSourceProperties, SourceError, SourceResult,
    StaticFactSource,
};
