//! Engine clock abstraction.
//!
//! Every timestamp the engine reads (fact generation times, cache freshness
//! checks) goes through an [`EngineClock`] passed explicitly to the registry
//! and engine constructors. Substituting a [`FixedClock`] makes TTL and
//! freshness behavior fully deterministic under test.

use std::sync::Mutex;

use time::OffsetDateTime;

/// Source of the current instant for the engine.
pub trait EngineClock: Send + Sync {
    /// Current instant in the local offset, when one can be determined.
    fn now(&self) -> OffsetDateTime;

    /// Current instant in UTC.
    fn utc_now(&self) -> OffsetDateTime;
}

// ──────────────────────────────────────────────
// SystemClock
// ──────────────────────────────────────────────

/// Clock backed by the operating system time. The default for production use.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl EngineClock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        // Local offset resolution can fail (e.g. multi-threaded processes on
        // some platforms); UTC is still a correct instant in that case.
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }

    fn utc_now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

// ──────────────────────────────────────────────
// FixedClock
// ──────────────────────────────────────────────

/// A settable clock that only moves when told to.
///
/// `set` and `advance` take `&self` so a `FixedClock` shared through an
/// `Arc<dyn EngineClock>` can still be driven from the test body.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        FixedClock {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, now: OffsetDateTime) {
        *self.lock() = now;
    }

    /// Move the clock forward (or backward, with a negative duration).
    pub fn advance(&self, by: time::Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OffsetDateTime> {
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EngineClock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.lock()
    }

    fn utc_now(&self) -> OffsetDateTime {
        self.lock().to_offset(time::UtcOffset::UTC)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
