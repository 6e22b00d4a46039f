//! webstatus - periodic HTTP status monitoring
//!
//! Targets are polled on their own intervals from a single one-second tick,
//! with a bounded number of requests in flight. Responses whose status code is
//! not in the accepted set produce a warning line on stdout or in a file.

pub mod cli;
pub mod config;
pub mod error;
pub mod monitoring;
pub mod settings;
pub mod sink;

use std::sync::Arc;

use tokio::sync::mpsc;

pub use error::AppError;
use monitoring::{
    AdmissionGate, Checker, Clock, HttpChecker, Reporter, RunSummary, Scheduler, SystemClock,
    Target,
};
pub use settings::Settings;
use sink::Sink;

/// Load everything `settings` points at and monitor until the time limit.
///
/// Startup failures (missing or malformed config, unusable output path) are
/// returned before any request is made.
pub async fn run(settings: &Settings) -> Result<RunSummary, AppError> {
    tracing::debug!("{}", settings);

    if !settings.config_path.exists() {
        return Err(config::ConfigError::NotFound(settings.config_path.clone()).into());
    }
    let sink = Sink::prepare(settings.output_path.as_deref())?;
    let targets = config::load_targets(&settings.config_path)?;
    let checker = Arc::new(HttpChecker::new(settings.request_timeout)?);

    monitor(targets, checker, sink, SystemClock::default(), settings).await
}

/// Drive the scheduler and reporter over an already loaded target list
pub async fn monitor<C: Clock>(
    targets: Vec<Target>,
    checker: Arc<dyn Checker>,
    sink: Sink,
    clock: C,
    settings: &Settings,
) -> Result<RunSummary, AppError> {
    let gate = AdmissionGate::new(settings.max_connections);
    let (outcome_tx, outcome_rx) = mpsc::channel(gate.capacity());

    let mut reporter = tokio::spawn(Reporter::new(sink, settings.failure, outcome_rx).run());
    let scheduler = Scheduler::new(targets, checker, gate, outcome_tx, clock)
        .with_time_limit(settings.time_limit)
        .with_policy(settings.dispatch);

    let stats = tokio::select! {
        stats = scheduler.run() => stats?,
        // The scheduler still holds a sender, so the reporter only ends early
        // when it aborts on a failed request.
        reported = &mut reporter => {
            return Ok(reported??);
        }
    };

    tracing::debug!("Dispatch finished, waiting for in-flight checks");
    let mut summary = reporter.await??;
    summary.ticks = stats.ticks;
    summary.dispatched = stats.dispatched;
    summary.deferred = stats.deferred;

    Ok(summary)
}
