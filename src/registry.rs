//! Fact source registry.
//!
//! Maps a fact id to a producer factory plus its [`FactSourceProperties`]
//! descriptor, and owns producer instance lifecycle according to the
//! descriptor's [`ActivationPolicy`]. Requests stamp the resulting fact with
//! the registry's injected clock, never the system wall clock directly.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::EngineClock;
use crate::error::EngineError;
use crate::fact::{valid_until_for, Fact};
use crate::source::{ActivationPolicy, FactSource, FactSourceProperties};

/// Creates producer instances for one registered fact id.
pub type SourceFactory = Box<dyn Fn() -> Arc<dyn FactSource> + Send + Sync>;

struct SourceSlot {
    properties: FactSourceProperties,
    factory: SourceFactory,
    /// The reused instance for `JustOnce` (created on first request) and
    /// `OnEngineStartup` (created at registration). Always `None` for
    /// `OnDemand`.
    activated: Option<Arc<dyn FactSource>>,
}

/// Registry of fact producers, keyed by fact id.
pub struct FactSourceRegistry {
    clock: Arc<dyn EngineClock>,
    slots: Mutex<BTreeMap<String, SourceSlot>>,
}

impl std::fmt::Debug for FactSourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactSourceRegistry").finish_non_exhaustive()
    }
}

impl FactSourceRegistry {
    pub fn new(clock: Arc<dyn EngineClock>) -> Self {
        FactSourceRegistry {
            clock,
            slots: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register a fact source under its descriptor.
    ///
    /// Fails with [`EngineError::MissingSourceMetadata`] when the descriptor
    /// declares no fact id and [`EngineError::DuplicateFactId`] when the id
    /// is already taken. With `OnEngineStartup` the factory runs here, so
    /// construction side effects happen before any fact is requested.
    /// Returns `&Self` so registrations chain.
    pub fn register<F>(
        &self,
        properties: FactSourceProperties,
        factory: F,
    ) -> Result<&Self, EngineError>
    where
        F: Fn() -> Arc<dyn FactSource> + Send + Sync + 'static,
    {
        if properties.fact_id.is_empty() {
            return Err(EngineError::MissingSourceMetadata {
                name: properties.name,
            });
        }

        let mut slots = self.lock_slots();
        if slots.contains_key(&properties.fact_id) {
            return Err(EngineError::DuplicateFactId {
                fact_id: properties.fact_id,
            });
        }

        let activated = match properties.activation_policy {
            ActivationPolicy::OnEngineStartup => Some(factory()),
            ActivationPolicy::OnDemand | ActivationPolicy::JustOnce => None,
        };

        tracing::debug!(
            fact_id = %properties.fact_id,
            policy = ?properties.activation_policy,
            "registered fact source"
        );

        slots.insert(
            properties.fact_id.clone(),
            SourceSlot {
                properties,
                factory: Box::new(factory),
                activated,
            },
        );
        Ok(self)
    }

    /// Whether a source is registered for `fact_id`.
    pub fn is_registered(&self, fact_id: &str) -> bool {
        self.lock_slots().contains_key(fact_id)
    }

    /// Whether the producer instance for `fact_id` already exists (eagerly
    /// for `OnEngineStartup`, after the first request for `JustOnce`).
    pub fn is_activated(&self, fact_id: &str) -> bool {
        self.lock_slots()
            .get(fact_id)
            .is_some_and(|slot| slot.activated.is_some())
    }

    /// Invoke the producer for `fact_id` and wrap its result in a [`Fact`].
    ///
    /// The producer instance is resolved per the registered activation
    /// policy; `generated_at` comes from the injected clock and the
    /// producer's TTL becomes an absolute `valid_until`, saturating instead
    /// of overflowing.
    pub async fn request_fact(&self, fact_id: &str) -> Result<Fact, EngineError> {
        let (properties, source) = {
            let mut slots = self.lock_slots();
            let slot = slots
                .get_mut(fact_id)
                .ok_or_else(|| EngineError::UnknownFact {
                    fact_id: fact_id.to_string(),
                })?;

            // `activated` is only ever populated for JustOnce and
            // OnEngineStartup, so OnDemand always falls through to the
            // factory without caching the instance.
            let source = match slot.activated.clone() {
                Some(source) => source,
                None => {
                    let source = (slot.factory)();
                    if slot.properties.activation_policy == ActivationPolicy::JustOnce {
                        slot.activated = Some(source.clone());
                    }
                    source
                }
            };
            (slot.properties.clone(), source)
        };

        let generated_at = self.clock.now();
        let result = source
            .produce()
            .await
            .map_err(|source| EngineError::FactFetchFailed {
                fact_id: fact_id.to_string(),
                source,
            })?;
        let (data, time_to_live) = result.into_parts();

        tracing::debug!(fact_id, ?time_to_live, "fact produced");

        Ok(Fact {
            fact_id: properties.fact_id,
            name: properties.name,
            description: properties.description,
            generated_at,
            valid_until: valid_until_for(generated_at, time_to_live),
            data,
        })
    }

    fn lock_slots(&self) -> MutexGuard<'_, BTreeMap<String, SourceSlot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
