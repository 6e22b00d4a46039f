use std::sync::Arc;

use tokio::sync::mpsc;

use super::checker::Checker;
use super::clock::Clock;
use super::executor::spawn_check;
use super::gate::{AdmissionGate, GateClosed};
use super::types::{CheckOutcome, Target};

/// What the loop does with a due target when the gate has no free slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Wait for a slot, stalling the rest of the tick
    #[default]
    Block,
    /// Leave the target due and retry it on the next tick
    Defer,
}

/// Due-time bookkeeping for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub interval_seconds: i64,
    pub last_start: i64,
}

impl ScheduleEntry {
    pub fn is_due(&self, now: i64) -> bool {
        now - self.last_start >= self.interval_seconds
    }
}

/// Counters kept by the loop itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub dispatched: u64,
    pub deferred: u64,
}

/// Tick-driven scheduler - decides which targets are due and dispatches checks.
///
/// The schedule lives in this struct and is only touched from [`Scheduler::run`];
/// checker tasks get their own copy of the target and report back over `outcomes`.
pub struct Scheduler<C: Clock> {
    targets: Vec<Arc<Target>>,
    schedule: Vec<ScheduleEntry>,
    checker: Arc<dyn Checker>,
    gate: AdmissionGate,
    outcomes: mpsc::Sender<CheckOutcome>,
    clock: C,
    time_limit: Option<u64>,
    policy: DispatchPolicy,
    stats: SchedulerStats,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(
        targets: Vec<Target>,
        checker: Arc<dyn Checker>,
        gate: AdmissionGate,
        outcomes: mpsc::Sender<CheckOutcome>,
        clock: C,
    ) -> Self {
        let schedule = targets
            .iter()
            .map(|target| ScheduleEntry {
                interval_seconds: i64::try_from(target.interval_seconds).unwrap_or(i64::MAX),
                last_start: 0,
            })
            .collect();

        Self {
            targets: targets.into_iter().map(Arc::new).collect(),
            schedule,
            checker,
            gate,
            outcomes,
            clock,
            time_limit: None,
            policy: DispatchPolicy::default(),
            stats: SchedulerStats::default(),
        }
    }

    /// Stop dispatching once `seconds` have passed; `0` means run forever
    pub fn with_time_limit(mut self, seconds: u64) -> Self {
        self.time_limit = (seconds > 0).then_some(seconds);
        self
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn schedule(&self) -> &[ScheduleEntry] {
        &self.schedule
    }

    /// Run the tick loop until the time limit is reached.
    ///
    /// Checks still in flight when this returns keep running; their outcomes go
    /// to whoever holds the receiving end of the channel.
    pub async fn run(mut self) -> Result<SchedulerStats, GateClosed> {
        let started = self.clock.now();
        tracing::info!(
            "Scheduler started with {} targets (limit: {})",
            self.targets.len(),
            self.time_limit.map_or_else(|| "none".to_string(), |limit| format!("{limit}s"))
        );

        loop {
            let now = self.clock.now();
            if self.limit_reached(started, now) {
                tracing::info!("Time limit reached, stopping dispatch");
                break;
            }

            self.stats.ticks += 1;
            self.dispatch_due(now).await?;
            self.clock.tick().await;
        }

        Ok(self.stats)
    }

    /// Whether the configured time limit has elapsed between `started` and `now`
    fn limit_reached(&self, started: i64, now: i64) -> bool {
        match self.time_limit {
            // Limits beyond i64 seconds saturate rather than wrap negative.
            Some(limit) => now - started >= i64::try_from(limit).unwrap_or(i64::MAX),
            None => false,
        }
    }

    /// Dispatch every target due at `now`, in registry order.
    ///
    /// Returns the indices that were dispatched.
    pub async fn dispatch_due(&mut self, now: i64) -> Result<Vec<usize>, GateClosed> {
        let mut dispatched = Vec::new();

        for (index, entry) in self.schedule.iter_mut().enumerate() {
            if !entry.is_due(now) {
                continue;
            }

            let slot = match self.policy {
                DispatchPolicy::Block => self.gate.acquire().await?,
                DispatchPolicy::Defer => match self.gate.try_acquire()? {
                    Some(slot) => slot,
                    None => {
                        self.stats.deferred += 1;
                        tracing::debug!(
                            "Admission gate saturated, deferring {}",
                            self.targets[index].url
                        );
                        continue;
                    }
                },
            };

            entry.last_start = now;
            self.stats.dispatched += 1;
            tracing::debug!("Dispatching check for {}", self.targets[index].url);

            spawn_check(
                self.checker.clone(),
                self.targets[index].clone(),
                now,
                slot,
                self.outcomes.clone(),
            );
            dispatched.push(index);
        }

        Ok(dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::checker::CheckError;
    use crate::monitoring::clock::ManualClock;
    use std::num::NonZeroUsize;
    use std::sync::Mutex;

    /// Records every requested URL and answers 200
    #[derive(Default)]
    struct RecordingChecker {
        requests: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Checker for RecordingChecker {
        async fn check(&self, url: &str) -> Result<u16, CheckError> {
            self.requests.lock().unwrap().push(url.to_string());
            Ok(200)
        }
    }

    fn targets() -> Vec<Target> {
        vec![
            Target::new("http://fast.test", vec![200], 1),
            Target::new("http://slow.test", vec![200], 5),
        ]
    }

    fn scheduler(
        targets: Vec<Target>,
        capacity: usize,
        clock: ManualClock,
    ) -> (Scheduler<ManualClock>, mpsc::Receiver<CheckOutcome>, AdmissionGate) {
        let (tx, rx) = mpsc::channel(64);
        let gate = AdmissionGate::new(NonZeroUsize::new(capacity).unwrap());
        let scheduler =
            Scheduler::new(targets, Arc::new(RecordingChecker::default()), gate.clone(), tx, clock);
        (scheduler, rx, gate)
    }

    #[tokio::test]
    async fn test_dispatch_counts_over_ten_ticks() {
        let (mut scheduler, _rx, _gate) = scheduler(targets(), 10, ManualClock::starting_at(1_000));

        let mut per_target = [0usize; 2];
        let mut slow_ticks = Vec::new();
        for tick in 0..10 {
            let dispatched = scheduler.dispatch_due(1_000 + tick).await.unwrap();
            for index in dispatched {
                per_target[index] += 1;
                if index == 1 {
                    slow_ticks.push(tick);
                }
            }
        }

        assert_eq!(per_target, [10, 2]);
        assert_eq!(slow_ticks, vec![0, 5]);
    }

    #[tokio::test]
    async fn test_dispatch_follows_registry_order() {
        let targets = vec![
            Target::new("http://a.test", vec![200], 1),
            Target::new("http://b.test", vec![200], 1),
            Target::new("http://c.test", vec![200], 1),
        ];
        let (mut scheduler, _rx, _gate) = scheduler(targets, 10, ManualClock::starting_at(0));

        let dispatched = scheduler.dispatch_due(50).await.unwrap();

        assert_eq!(dispatched, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_last_start_set_at_dispatch() {
        let (mut scheduler, _rx, _gate) = scheduler(targets(), 10, ManualClock::starting_at(0));

        scheduler.dispatch_due(7_000).await.unwrap();
        assert!(scheduler.schedule().iter().all(|entry| entry.last_start == 7_000));

        // Same tick again: nothing is due twice.
        assert!(scheduler.dispatch_due(7_000).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_at_time_limit() {
        let clock = ManualClock::starting_at(1_000);
        let (scheduler, mut rx, _gate) = scheduler(targets(), 10, clock.clone());

        let stats = scheduler.with_time_limit(3).run().await.unwrap();

        assert_eq!(stats.ticks, 3);
        // fast target on every tick, slow target on the first one only
        assert_eq!(stats.dispatched, 4);
        assert_eq!(clock.now(), 1_003);

        let mut received = 0;
        while rx.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, 4);
    }

    #[test]
    fn test_huge_time_limit_does_not_wrap() {
        let (scheduler, _rx, _gate) = scheduler(targets(), 1, ManualClock::starting_at(1_000));
        let scheduler = scheduler.with_time_limit(u64::MAX);

        assert!(!scheduler.limit_reached(1_000, 1_000));
        assert!(!scheduler.limit_reached(1_000, 1_000_000));
    }

    #[test]
    fn test_limit_reached_boundary() {
        let (scheduler, _rx, _gate) = scheduler(targets(), 1, ManualClock::starting_at(0));
        let scheduler = scheduler.with_time_limit(3);

        assert!(!scheduler.limit_reached(10, 12));
        assert!(scheduler.limit_reached(10, 13));
    }

    #[tokio::test]
    async fn test_ten_tick_run_through_loop() {
        let (scheduler, _rx, _gate) = scheduler(targets(), 10, ManualClock::starting_at(1_000));

        let stats = scheduler.with_time_limit(10).run().await.unwrap();

        assert_eq!(stats.ticks, 10);
        assert_eq!(stats.dispatched, 12);
    }

    #[tokio::test]
    async fn test_defer_keeps_target_due() {
        let (scheduler, _rx, gate) = scheduler(targets(), 1, ManualClock::starting_at(0));
        let mut scheduler = scheduler.with_policy(DispatchPolicy::Defer);
        let held = gate.acquire().await.unwrap();

        assert!(scheduler.dispatch_due(100).await.unwrap().is_empty());
        assert_eq!(scheduler.stats.deferred, 2);
        assert!(scheduler.schedule().iter().all(|entry| entry.is_due(100)));

        held.release();
        assert_eq!(scheduler.dispatch_due(101).await.unwrap(), vec![0]);
    }

    #[test]
    fn test_entry_is_due() {
        let entry = ScheduleEntry { interval_seconds: 60, last_start: 1_000 };

        assert!(!entry.is_due(1_059));
        assert!(entry.is_due(1_060));
        assert!(ScheduleEntry { interval_seconds: 0, last_start: 5 }.is_due(5));
    }
}
