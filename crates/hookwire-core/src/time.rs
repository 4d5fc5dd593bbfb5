//! Clock abstraction for testable timing.
//!
//! Delivery retries suspend on backoff delays; injecting the clock lets
//! tests drive those delays deterministically instead of sleeping for
//! real.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};

/// Time source for envelope timestamps and backoff sleeps.
///
/// Production code uses [`RealClock`]; tests inject [`TestClock`] to make
/// retry timing instantaneous and timestamps reproducible.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current wall-clock time.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Suspends for the given duration.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Production clock backed by the system time and tokio's timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Deterministic clock for tests.
///
/// Starts at a fixed instant; `sleep` advances virtual time immediately
/// instead of suspending, so retry loops run to completion without
/// real-time delays. Cloning shares the underlying time source.
#[derive(Debug, Clone)]
pub struct TestClock {
    // Virtual time as milliseconds since the Unix epoch.
    epoch_ms: Arc<AtomicU64>,
}

impl TestClock {
    /// Creates a test clock starting at an arbitrary fixed instant.
    pub fn new() -> Self {
        // 2024-01-01T00:00:00Z
        Self { epoch_ms: Arc::new(AtomicU64::new(1_704_067_200_000)) }
    }

    /// Creates a test clock starting at the given time.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        let ms = u64::try_from(start.timestamp_millis()).unwrap_or(0);
        Self { epoch_ms: Arc::new(AtomicU64::new(ms)) }
    }

    /// Advances virtual time.
    pub fn advance(&self, duration: Duration) {
        let ms = u64::try_from(duration.as_millis().min(u128::from(u64::MAX))).unwrap_or(u64::MAX);
        self.epoch_ms.fetch_add(ms, Ordering::AcqRel);
    }

    /// Total virtual time slept so far, relative to the start instant.
    pub fn now_ms(&self) -> u64 {
        self.epoch_ms.load(Ordering::Acquire)
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now_utc(&self) -> DateTime<Utc> {
        let ms = self.epoch_ms.load(Ordering::Acquire);
        Utc.timestamp_millis_opt(i64::try_from(ms).unwrap_or(i64::MAX))
            .single()
            .unwrap_or_else(Utc::now)
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.advance(duration);
        // Yield so concurrently dispatched deliveries interleave.
        Box::pin(tokio::task::yield_now())
    }
}
