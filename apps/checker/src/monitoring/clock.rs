use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Length of one scheduler tick
pub const TICK: Duration = Duration::from_secs(1);

/// Time source driving the scheduler loop
#[async_trait::async_trait]
pub trait Clock: Send {
    /// Current Unix time in whole seconds
    fn now(&self) -> i64;

    /// Suspend until the next tick boundary
    async fn tick(&mut self);
}

/// Wall clock paced by a tokio interval
#[derive(Debug, Default)]
pub struct SystemClock {
    ticker: Option<Interval>,
}

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or_default()
    }

    async fn tick(&mut self) {
        // Created lazily so the first boundary is one tick after the first dispatch.
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        ticker.tick().await;
    }
}

/// Simulated clock that moves forward one second per tick.
///
/// Clones share the same time, so a test can keep a handle while the scheduler
/// owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn starting_at(unix_seconds: i64) -> Self {
        Self { now: Arc::new(AtomicI64::new(unix_seconds)) }
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn tick(&mut self) {
        self.advance(TICK.as_secs() as i64);
        // Let spawned checks make progress between simulated ticks.
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_advances_per_tick() {
        let mut clock = ManualClock::starting_at(100);
        let observer = clock.clone();

        clock.tick().await;
        clock.tick().await;

        assert_eq!(observer.now(), 102);
    }

    #[tokio::test]
    async fn test_system_clock_waits_a_tick() {
        let mut clock = SystemClock::default();
        let before = clock.now();
        let started = Instant::now();

        clock.tick().await;

        assert!(started.elapsed() >= TICK);
        assert!(clock.now() > before);
    }
}
