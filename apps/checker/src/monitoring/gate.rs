use std::num::NonZeroUsize;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// Default number of checks allowed in flight at once
pub const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Error)]
#[error("admission gate is closed")]
pub struct GateClosed;

/// Bounded concurrency limiter for in-flight checks.
///
/// Cloning shares the same slots.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One held slot of an [`AdmissionGate`]; dropping it returns the slot
#[derive(Debug)]
pub struct GateSlot {
    _permit: OwnedSemaphorePermit,
}

impl GateSlot {
    /// Return the slot to the gate
    pub fn release(self) {}
}

impl AdmissionGate {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self { semaphore: Arc::new(Semaphore::new(capacity)), capacity }
    }

    /// Wait until a slot is free and take it.
    ///
    /// The semaphore is never closed while a gate exists, so this only errors if
    /// that assumption is broken.
    pub async fn acquire(&self) -> Result<GateSlot, GateClosed> {
        let permit = self.semaphore.clone().acquire_owned().await.map_err(|_| GateClosed)?;
        Ok(GateSlot { _permit: permit })
    }

    /// Take a slot if one is free right now
    pub fn try_acquire(&self) -> Result<Option<GateSlot>, GateClosed> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => Ok(Some(GateSlot { _permit: permit })),
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(GateClosed),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}
