//! Fact producer capability.
//!
//! A [`FactSource`] asynchronously produces one fact payload together with a
//! time-to-live. Sources are registered with a [`FactSourceProperties`]
//! descriptor holding identity, display metadata, and an activation policy that
//! governs the producer's instance lifecycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::fact::FactData;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors that can occur while a fact source produces a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// A producer-specific error occurred.
    #[error("fact source error: {0}")]
    Produce(String),

    /// The producer did not complete within the engine's fetch deadline.
    #[error("fact source timed out after {limit:?}")]
    Timeout { limit: Duration },

    /// The fetch task was torn down before the producer completed.
    #[error("fact fetch task was canceled: {reason}")]
    Canceled { reason: String },
}

// ──────────────────────────────────────────────
// Descriptor
// ──────────────────────────────────────────────

/// How producer instances are created for a registered fact id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPolicy {
    /// A new producer instance per request.
    OnDemand,
    /// One producer instance, created on first use and reused. The instance
    /// is cached, not the fact value; every request still invokes it.
    JustOnce,
    /// The producer instance is created eagerly at registration time, so
    /// construction side effects happen at startup.
    OnEngineStartup,
}

/// Static descriptor a fact source registers under: identity, display
/// metadata, and activation policy.
#[derive(Debug, Clone)]
pub struct FactSourceProperties {
    pub fact_id: String,
    pub name: String,
    pub description: String,
    pub activation_policy: ActivationPolicy,
}

impl FactSourceProperties {
    pub fn new(
        fact_id: &str,
        name: &str,
        description: &str,
        activation_policy: ActivationPolicy,
    ) -> Self {
        FactSourceProperties {
            fact_id: fact_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            activation_policy,
        }
    }
}

// ──────────────────────────────────────────────
// SourceResult + trait
// ──────────────────────────────────────────────

/// A producer's output: the payload plus how long it stays valid.
pub struct SourceResult {
    data: FactData,
    time_to_live: Duration,
}

impl SourceResult {
    /// Wrap a payload with its time-to-live. `Duration::MAX` means the
    /// fact effectively never expires.
    pub fn new<T: Send + Sync + 'static>(data: T, time_to_live: Duration) -> Self {
        SourceResult {
            data: Arc::new(data),
            time_to_live,
        }
    }

    pub(crate) fn into_parts(self) -> (FactData, Duration) {
        (self.data, self.time_to_live)
    }
}

/// Asynchronous producer of one fact's payload.
///
/// Implementations fetch from external systems (DNS, OS APIs, databases)
/// and may suspend on I/O. Retry policy, if any, belongs to the producer or
/// an external wrapper, never to the engine.
#[async_trait]
pub trait FactSource: Send + Sync {
    async fn produce(&self) -> Result<SourceResult, SourceError>;
}

// ──────────────────────────────────────────────
// StaticFactSource
// ──────────────────────────────────────────────

/// A fact source that returns a fixed payload on every invocation.
///
/// Useful for testing and for facts whose value is known ahead of time.
#[derive(Clone)]
pub struct StaticFactSource {
    data: FactData,
    time_to_live: Duration,
}

impl StaticFactSource {
    pub fn new<T: Send + Sync + 'static>(data: T, time_to_live: Duration) -> Self {
        StaticFactSource {
            data: Arc::new(data),
            time_to_live,
        }
    }
}

#[async_trait]
impl FactSource for StaticFactSource {
    async fn produce(&self) -> Result<SourceResult, SourceError> {
        Ok(SourceResult {
            data: self.data.clone(),
            time_to_live: self.time_to_live,
        })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_source_returns_fixed_payload() {
        let source = StaticFactSource::new("h1".to_string(), Duration::from_secs(300));

        let (data, ttl) = source.produce().await.unwrap().into_parts();
        assert_eq!(data.downcast_ref::<String>().unwrap(), "h1");
        assert_eq!(ttl, Duration::from_secs(300));

        // Same payload on every call.
        let (data, _) = source.produce().await.unwrap().into_parts();
        assert_eq!(data.downcast_ref::<String>().unwrap(), "h1");
    }

    #[test]
    fn error_display() {
        let err = SourceError::Produce("connection refused".to_string());
        assert_eq!(err.to_string(), "fact source error: connection refused");

        let err = SourceError::Timeout {
            limit: Duration::from_millis(50),
        };
        assert_eq!(err.to_string(), "fact source timed out after 50ms");
    }
}
