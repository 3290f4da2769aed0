//! Built-in fact sources.
//!
//! Date-time facts backed by the engine clock, registered under well-known
//! ids. Both carry a zero TTL: the instant a clock reading is produced it is
//! already the past, so every evaluation that needs the current time
//! refetches it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::clock::EngineClock;
use crate::source::{
    ActivationPolicy, FactSource, FactSourceProperties, SourceError, SourceResult,
};

/// Well-known fact ids for the built-in sources.
pub mod fact_ids {
    pub const CURRENT_DATE_TIME: &str = "factum.datetime.current";
    pub const CURRENT_UTC_DATE_TIME: &str = "factum.datetime.current_utc";
}

/// Produces the current local date-time as a `time::OffsetDateTime` payload.
pub struct CurrentDateTimeFactSource {
    clock: Arc<dyn EngineClock>,
}

impl CurrentDateTimeFactSource {
    pub fn new(clock: Arc<dyn EngineClock>) -> Self {
        CurrentDateTimeFactSource { clock }
    }

    pub fn properties() -> FactSourceProperties {
        FactSourceProperties::new(
            fact_ids::CURRENT_DATE_TIME,
            "CurrentDateTime",
            "Current date and time, in the local offset",
            ActivationPolicy::OnEngineStartup,
        )
    }
}

#[async_trait]
impl FactSource for CurrentDateTimeFactSource {
    async fn produce(&self) -> Result<SourceResult, SourceError> {
        Ok(SourceResult::new(self.clock.now(), Duration::ZERO))
    }
}

/// Produces the current UTC date-time as a `time::OffsetDateTime` payload.
pub struct CurrentUtcDateTimeFactSource {
    clock: Arc<dyn EngineClock>,
}

impl CurrentUtcDateTimeFactSource {
    pub fn new(clock: Arc<dyn EngineClock>) -> Self {
        CurrentUtcDateTimeFactSource { clock }
    }

    pub fn properties() -> FactSourceProperties {
        FactSourceProperties::new(
            fact_ids::CURRENT_UTC_DATE_TIME,
            "CurrentUtcDateTime",
            "Current date and time, in UTC",
            ActivationPolicy::OnEngineStartup,
        )
    }
}

#[async_trait]
impl FactSource for CurrentUtcDateTimeFactSource {
    async fn produce(&self) -> Result<SourceResult, SourceError> {
        Ok(SourceResult::new(self.clock.utc_now(), Duration::ZERO))
    }
}

/// Register both date-time sources against a registry sharing the given
/// clock.
pub fn register_date_time_sources(
    registry: &crate::registry::FactSourceRegistry,
    clock: Arc<dyn EngineClock>,
) -> Result<(), crate::error::EngineError> {
    let local_clock = clock.clone();
    registry
        .register(CurrentDateTimeFactSource::properties(), move || {
            Arc::new(CurrentDateTimeFactSource::new(local_clock.clone()))
        })?
        .register(CurrentUtcDateTimeFactSource::properties(), move || {
            Arc::new(CurrentUtcDateTimeFactSource::new(clock.clone()))
        })?;
    Ok(())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
