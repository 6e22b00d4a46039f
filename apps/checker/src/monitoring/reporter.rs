use thiserror::Error;
use tokio::sync::mpsc;

use super::checker::CheckError;
use super::types::{CheckOutcome, RunSummary};
use crate::sink::Sink;

/// How a failed request affects the rest of the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and keep monitoring
    #[default]
    Continue,
    /// Stop the run on the first failed request
    Abort,
}

#[derive(Debug, Error)]
#[error("check of {url} failed: {source}")]
pub struct RequestFailed {
    pub url: String,
    #[source]
    pub source: CheckError,
}

/// Single consumer of check outcomes; the only writer to the sink
pub struct Reporter {
    sink: Sink,
    policy: FailurePolicy,
    outcomes: mpsc::Receiver<CheckOutcome>,
    summary: RunSummary,
}

impl Reporter {
    pub fn new(sink: Sink, policy: FailurePolicy, outcomes: mpsc::Receiver<CheckOutcome>) -> Self {
        Self { sink, policy, outcomes, summary: RunSummary::default() }
    }

    /// Consume outcomes until every sender is gone.
    ///
    /// Only the accepted/warnings/failures counters of the summary are filled in.
    pub async fn run(mut self) -> Result<RunSummary, RequestFailed> {
        while let Some(outcome) = self.outcomes.recv().await {
            match outcome {
                CheckOutcome::Accepted { url, status } => {
                    self.summary.accepted += 1;
                    tracing::debug!("{} returned accepted status {}", url, status);
                }
                CheckOutcome::Mismatch(warning) => {
                    self.summary.warnings += 1;
                    if let Err(e) = self.sink.write(&warning.render()).await {
                        tracing::error!("Failed to write warning for {} to {}: {}", warning.url, self.sink, e);
                    }
                }
                CheckOutcome::Failed { url, error } => {
                    self.summary.failures += 1;
                    match self.policy {
                        FailurePolicy::Continue => {
                            tracing::error!("Check of {} failed: {}", url, error);
                        }
                        FailurePolicy::Abort => {
                            return Err(RequestFailed { url, source: error });
                        }
                    }
                }
            }
        }

        Ok(self.summary)
    }
}
