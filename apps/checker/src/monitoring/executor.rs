use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::checker::Checker;
use super::gate::GateSlot;
use super::types::{CheckOutcome, Target, Warning};

/// Run one check against `target` and classify the result.
///
/// `checked_at` is the tick time the check was dispatched at and is what
/// warnings are stamped with.
pub async fn execute_check(checker: &dyn Checker, target: &Target, checked_at: i64) -> CheckOutcome {
    match checker.check(&target.url).await {
        Ok(status) if target.accepts(status) => {
            CheckOutcome::Accepted { url: target.url.clone(), status }
        }
        Ok(status) => CheckOutcome::Mismatch(Warning::new(target, checked_at, status)),
        Err(error) => CheckOutcome::Failed { url: target.url.clone(), error },
    }
}

/// Spawn a detached checker task holding `slot` until its outcome is delivered
pub fn spawn_check(
    checker: Arc<dyn Checker>,
    target: Arc<Target>,
    checked_at: i64,
    slot: GateSlot,
    outcomes: mpsc::Sender<CheckOutcome>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = execute_check(checker.as_ref(), &target, checked_at).await;

        if outcomes.send(outcome).await.is_err() {
            tracing::debug!("Reporter gone, dropping outcome for {}", target.url);
        }

        slot.release();
    })
}
