//! Error taxonomy for the satisfaction engine.
//!
//! Every failure the engine can produce is a distinct variant here; nothing
//! is silently swallowed or merged. Producer-side failures carry a
//! [`SourceError`] cause so callers can distinguish a failing producer from
//! a timed-out one.

use crate::source::SourceError;

/// All errors that can be returned by the engine, registry, cache, or
/// condition tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A fact source was registered under a fact id that is already taken.
    #[error("duplicate fact id '{fact_id}' in source registry")]
    DuplicateFactId { fact_id: String },

    /// A live (non-tombstoned) cache entry already exists for this fact id.
    #[error("duplicated fact '{fact_id}' in engine cache")]
    DuplicateFact { fact_id: String },

    /// No registered fact source provides this fact id.
    #[error("no registered fact source provides '{fact_id}'")]
    UnknownFact { fact_id: String },

    /// A fact source descriptor declares no fact id.
    #[error("fact source '{name}' declares no fact id")]
    MissingSourceMetadata { name: String },

    /// A leaf condition descriptor declares no fact id.
    #[error("condition '{condition}' declares no fact id")]
    MissingConditionMetadata { condition: String },

    /// A fact payload was read as a type other than the one its producer
    /// supplied. Fact ids carry one concrete payload type for the lifetime
    /// of the system, so this is a wiring defect.
    #[error("fact type mismatch for '{fact_id}': expected {expected}")]
    FactTypeMismatch {
        fact_id: String,
        expected: &'static str,
    },

    /// A producer failed or timed out while fetching one fact. Sibling
    /// fetches are unaffected; the error surfaces per identity.
    #[error("failed to fetch fact '{fact_id}': {source}")]
    FactFetchFailed {
        fact_id: String,
        source: SourceError,
    },

    /// Evaluation finished with an overall `Unknown` status. Once all
    /// required facts are bound the tree must resolve to Satisfied or
    /// Failed; `Unknown` escaping the root means a leaf is not wired to
    /// the fact it declared.
    #[error("evaluation finished with an unknown satisfaction status")]
    IndeterminateResult,

    /// A rule handler reported a failure.
    #[error("rule handler failed: {message}")]
    HandlerFailed { message: String },
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
