/// Monitoring engine module - schedules and executes status checks
///
/// This module is responsible for:
/// - Deciding which targets are due on each tick
/// - Limiting how many checks are in flight
/// - Executing HTTP checks and classifying the status code
/// - Reporting mismatches and request failures
pub mod checker;
pub mod clock;
pub mod executor;
pub mod gate;
pub mod reporter;
pub mod scheduler;
pub mod types;

pub use checker::{CheckError, Checker, HttpChecker};
pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::AdmissionGate;
pub use reporter::{FailurePolicy, Reporter};
pub use scheduler::{DispatchPolicy, Scheduler};
pub use types::{CheckOutcome, RunSummary, Target, Warning};
