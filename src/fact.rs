//! Fact envelope: a typed payload with identity and a validity window.
//!
//! A `Fact` is created by the source registry each time a producer runs and
//! is immutable afterward; ownership passes to the fact cache. The payload
//! is type-erased so facts with different payload types can share one cache,
//! but each fact id carries exactly one concrete payload type for the
//! lifetime of the system; a wrong [`Fact::data`] read is a wiring defect,
//! not a recoverable condition.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::EngineError;

/// Type-erased, shareable fact payload.
pub type FactData = Arc<dyn Any + Send + Sync>;

/// An immutable value produced by a fact source, valid until `valid_until`.
#[derive(Clone)]
pub struct Fact {
    pub fact_id: String,
    pub name: String,
    pub description: String,
    pub generated_at: OffsetDateTime,
    pub valid_until: OffsetDateTime,
    pub(crate) data: FactData,
}

impl Fact {
    /// Build a fact with empty display metadata. Use [`Fact::with_metadata`]
    /// to attach a name and description.
    pub fn new<T: Send + Sync + 'static>(
        fact_id: &str,
        generated_at: OffsetDateTime,
        valid_until: OffsetDateTime,
        data: T,
    ) -> Fact {
        Fact {
            fact_id: fact_id.to_string(),
            name: String::new(),
            description: String::new(),
            generated_at,
            valid_until,
            data: Arc::new(data),
        }
    }

    /// Attach display metadata (opaque to evaluation logic).
    pub fn with_metadata(mut self, name: &str, description: &str) -> Fact {
        self.name = name.to_string();
        self.description = description.to_string();
        self
    }

    /// Read the payload as `T`.
    pub fn data<T: 'static>(&self) -> Result<&T, EngineError> {
        self.data
            .downcast_ref::<T>()
            .ok_or_else(|| EngineError::FactTypeMismatch {
                fact_id: self.fact_id.clone(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// The type-erased payload, for handing to rule handlers.
    pub fn raw_data(&self) -> &FactData {
        &self.data
    }
}

impl fmt::Debug for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fact")
            .field("fact_id", &self.fact_id)
            .field("name", &self.name)
            .field("generated_at", &self.generated_at)
            .field("valid_until", &self.valid_until)
            .finish_non_exhaustive()
    }
}

/// Convert a producer's time-to-live into an absolute expiry instant.
///
/// A TTL too large to represent (`Duration::MAX` is the conventional
/// "never expires") saturates to the maximum representable instant instead
/// of erroring.
pub(crate) fn valid_until_for(
    generated_at: OffsetDateTime,
    time_to_live: std::time::Duration,
) -> OffsetDateTime {
    let max = PrimitiveDateTime::MAX.assume_utc();
    match time::Duration::try_from(time_to_live) {
        Ok(ttl) => generated_at.checked_add(ttl).unwrap_or(max),
        Err(_) => max,
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
