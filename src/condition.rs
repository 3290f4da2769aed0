//! Condition trees: tri-state satisfaction over bound facts.
//!
//! A tree is a polymorphic boolean expression over fact ids. Leaves test one
//! fact's payload; [`AndCondition`] / [`OrCondition`] combine ordered
//! children with short-circuiting. Nodes are immutable after construction:
//! the facts a tree is evaluated against live in the session's
//! [`BoundFacts`] table, never on the nodes, so one tree instance is safely
//! reusable across sequential or concurrent evaluations.

use std::sync::OnceLock;

use crate::error::EngineError;
use crate::session::BoundFacts;

// ──────────────────────────────────────────────
// SatisfactionStatus
// ──────────────────────────────────────────────

/// Tri-state result of evaluating a condition.
///
/// A genuine three-variant sum type: a leaf returns exactly one of these per
/// call, and the combinators below cannot produce a "satisfied and failed"
/// hybrid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatisfactionStatus {
    /// No fact was bound for the leaf, or no child resolved the composite.
    Unknown,
    Satisfied,
    Failed,
}

impl SatisfactionStatus {
    pub fn is_satisfied(self) -> bool {
        matches!(self, SatisfactionStatus::Satisfied)
    }

    /// Accumulate a child status under AND: `Failed` dominates, `Satisfied`
    /// absorbs `Unknown`.
    pub fn and_with(self, other: SatisfactionStatus) -> SatisfactionStatus {
        use SatisfactionStatus::*;
        match (self, other) {
            (Failed, _) | (_, Failed) => Failed,
            (Satisfied, _) | (_, Satisfied) => Satisfied,
            (Unknown, Unknown) => Unknown,
        }
    }

    /// Accumulate a child status under OR: `Satisfied` dominates, `Failed`
    /// absorbs `Unknown`.
    pub fn or_with(self, other: SatisfactionStatus) -> SatisfactionStatus {
        use SatisfactionStatus::*;
        match (self, other) {
            (Satisfied, _) | (_, Satisfied) => Satisfied,
            (Failed, _) | (_, Failed) => Failed,
            (Unknown, Unknown) => Unknown,
        }
    }
}

// ──────────────────────────────────────────────
// Condition trait
// ──────────────────────────────────────────────

/// Static descriptor a leaf condition type declares: the fact id it tests
/// plus display metadata.
#[derive(Debug, Clone)]
pub struct ConditionProperties {
    pub fact_id: String,
    pub name: String,
    pub description: String,
}

impl ConditionProperties {
    pub fn new(fact_id: &str, name: &str, description: &str) -> Self {
        ConditionProperties {
            fact_id: fact_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// A node in a condition tree.
pub trait Condition: Send + Sync {
    /// Fact ids this node needs bound before evaluation: the leaf's declared
    /// id, or the deduplicated union over a composite's children. Computed
    /// once and memoized; stable across repeated calls.
    fn required_fact_ids(&self) -> Result<&[String], EngineError>;

    /// Evaluate against the session's bound facts. A leaf whose fact was
    /// never bound reports `Unknown`.
    fn satisfaction(&self, bound: &BoundFacts) -> Result<SatisfactionStatus, EngineError>;
}

// ──────────────────────────────────────────────
// Leaf conditions
// ──────────────────────────────────────────────

/// A leaf predicate over one fact's payload.
///
/// Implementors carry their comparison values as struct fields and declare
/// the fact they test through [`FactCondition::properties`]. Wrap in a
/// [`LeafCondition`] to place it in a tree.
pub trait FactCondition: Send + Sync {
    type Payload: Send + Sync + 'static;

    /// The declared fact id and display metadata for this condition type.
    fn properties() -> ConditionProperties
    where
        Self: Sized;

    /// The predicate proper, invoked only when the fact is bound.
    fn test(&self, payload: &Self::Payload) -> bool;
}

/// Adapter placing a [`FactCondition`] in a condition tree.
pub struct LeafCondition<C: FactCondition> {
    condition: C,
    required: OnceLock<Vec<String>>,
}

impl<C: FactCondition + 'static> LeafCondition<C> {
    pub fn new(condition: C) -> Self {
        LeafCondition {
            condition,
            required: OnceLock::new(),
        }
    }

    /// Convenience for building trees of boxed nodes.
    pub fn boxed(condition: C) -> Box<dyn Condition> {
        Box::new(LeafCondition::new(condition))
    }
}

impl<C: FactCondition> Condition for LeafCondition<C> {
    fn required_fact_ids(&self) -> Result<&[String], EngineError> {
        if let Some(ids) = self.required.get() {
            return Ok(ids);
        }
        let properties = C::properties();
        if properties.fact_id.is_empty() {
            return Err(EngineError::MissingConditionMetadata {
                condition: std::any::type_name::<C>().to_string(),
            });
        }
        Ok(self.required.get_or_init(|| vec![properties.fact_id]))
    }

    fn satisfaction(&self, bound: &BoundFacts) -> Result<SatisfactionStatus, EngineError> {
        let fact_id = &self.required_fact_ids()?[0];
        let Some(fact) = bound.get(fact_id) else {
            return Ok(SatisfactionStatus::Unknown);
        };
        let payload = fact.data::<C::Payload>()?;
        Ok(if self.condition.test(payload) {
            SatisfactionStatus::Satisfied
        } else {
            SatisfactionStatus::Failed
        })
    }
}

// ──────────────────────────────────────────────
// Composite conditions
// ──────────────────────────────────────────────

fn composed_required_ids<'a>(
    children: &[Box<dyn Condition>],
    memo: &'a OnceLock<Vec<String>>,
) -> Result<&'a [String], EngineError> {
    if let Some(ids) = memo.get() {
        return Ok(ids);
    }
    let mut ids: Vec<String> = Vec::new();
    for child in children {
        for id in child.required_fact_ids()? {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }
    Ok(memo.get_or_init(|| ids))
}

/// Satisfied when every child is; fails at the first failed child without
/// evaluating the rest.
pub struct AndCondition {
    children: Vec<Box<dyn Condition>>,
    required: OnceLock<Vec<String>>,
}

impl AndCondition {
    pub fn new(children: Vec<Box<dyn Condition>>) -> Self {
        AndCondition {
            children,
            required: OnceLock::new(),
        }
    }
}

impl Condition for AndCondition {
    fn required_fact_ids(&self) -> Result<&[String], EngineError> {
        composed_required_ids(&self.children, &self.required)
    }

    fn satisfaction(&self, bound: &BoundFacts) -> Result<SatisfactionStatus, EngineError> {
        let mut status = SatisfactionStatus::Unknown;
        for child in &self.children {
            status = status.and_with(child.satisfaction(bound)?);
            if status == SatisfactionStatus::Failed {
                return Ok(SatisfactionStatus::Failed);
            }
        }
        Ok(status)
    }
}

/// Satisfied at the first satisfied child without evaluating the rest;
/// fails when every evaluated child failed.
pub struct OrCondition {
    children: Vec<Box<dyn Condition>>,
    required: OnceLock<Vec<String>>,
}

impl OrCondition {
    pub fn new(children: Vec<Box<dyn Condition>>) -> Self {
        OrCondition {
            children,
            required: OnceLock::new(),
        }
    }
}

impl Condition for OrCondition {
    fn required_fact_ids(&self) -> Result<&[String], EngineError> {
        composed_required_ids(&self.children, &self.required)
    }

    fn satisfaction(&self, bound: &BoundFacts) -> Result<SatisfactionStatus, EngineError> {
        let mut status = SatisfactionStatus::Unknown;
        for child in &self.children {
            status = status.or_with(child.satisfaction(bound)?);
            if status == SatisfactionStatus::Satisfied {
                return Ok(SatisfactionStatus::Satisfied);
            }
        }
        Ok(status)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
