//! Admission control for the bulk fetch pool
//!
//! Bounds the number of in-flight fetch tasks with a semaphore. A submission
//! first tries for a free slot without suspending, then waits up to the
//! configured admission wait. An elapsed wait is not a failure: the overflow
//! policy is to run the task inline on the submitting task, so saturation
//! serializes work instead of dropping it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sable_domain::{Result, SableError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcome of an admission request.
pub(crate) enum Admission {
    /// A pool slot was acquired. The permit must be held for the lifetime of
    /// the spawned task; dropping it frees the slot.
    Slot(OwnedSemaphorePermit),
    /// Capacity stayed exhausted for the whole admission wait; the task runs
    /// inline on the submitting task.
    RunInline,
}

/// Bounds the number of concurrently executing fetch tasks.
pub(crate) struct AdmissionController {
    semaphore: Arc<Semaphore>,
    admission_wait: Option<Duration>,
    admitted: AtomicU64,
    inline_runs: AtomicU64,
}

impl AdmissionController {
    pub(crate) fn new(max_concurrent: usize, admission_wait: Option<Duration>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            admission_wait,
            admitted: AtomicU64::new(0),
            inline_runs: AtomicU64::new(0),
        }
    }

    /// Wait for a free execution slot.
    ///
    /// Honours `cancel` for the whole wait; a cancelled submission surfaces
    /// as [`SableError::Cancelled`] and never as an inline run.
    pub(crate) async fn admit(&self, cancel: &CancellationToken) -> Result<Admission> {
        if cancel.is_cancelled() {
            return Err(SableError::Cancelled);
        }

        if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
            self.admitted.fetch_add(1, Ordering::Relaxed);
            return Ok(Admission::Slot(permit));
        }

        match self.admission_wait {
            Some(wait) => self.admit_bounded(wait, cancel).await,
            None => self.admit_blocking(cancel).await,
        }
    }

    async fn admit_bounded(&self, wait: Duration, cancel: &CancellationToken) -> Result<Admission> {
        tokio::select! {
            () = cancel.cancelled() => Err(SableError::Cancelled),
            acquired = tokio::time::timeout(wait, Arc::clone(&self.semaphore).acquire_owned()) => {
                match acquired {
                    Ok(Ok(permit)) => {
                        self.admitted.fetch_add(1, Ordering::Relaxed);
                        Ok(Admission::Slot(permit))
                    }
                    // Semaphore closed; never happens, the pool keeps it open
                    Ok(Err(_)) => {
                        Err(SableError::Internal("admission semaphore closed".into()))
                    }
                    Err(_) => {
                        self.inline_runs.fetch_add(1, Ordering::Relaxed);
                        debug!(wait_ms = wait.as_millis() as u64, "admission wait elapsed; running fetch inline");
                        Ok(Admission::RunInline)
                    }
                }
            }
        }
    }

    async fn admit_blocking(&self, cancel: &CancellationToken) -> Result<Admission> {
        tokio::select! {
            () = cancel.cancelled() => Err(SableError::Cancelled),
            acquired = Arc::clone(&self.semaphore).acquire_owned() => {
                match acquired {
                    Ok(permit) => {
                        self.admitted.fetch_add(1, Ordering::Relaxed);
                        Ok(Admission::Slot(permit))
                    }
                    Err(_) => Err(SableError::Internal("admission semaphore closed".into())),
                }
            }
        }
    }

    /// Tasks admitted into pool slots.
    #[cfg(test)]
    pub(crate) fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Acquire)
    }

    /// Tasks that ran inline after an elapsed admission wait.
    pub(crate) fn inline_runs(&self) -> u64 {
        self.inline_runs.load(Ordering::Acquire)
    }
}
