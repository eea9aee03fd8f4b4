//! Admission and CPU concurrency control for the upload pipeline.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, thiserror::Error)]
pub enum GovernorError {
    #[error("Upload pipeline is at capacity")]
    PipelineFull,

    #[error("Concurrency governor is shut down")]
    Closed,

    #[error("CPU task failed: {0}")]
    Task(String),
}

/// A held pipeline slot. The slot is returned to the pool when dropped, so a
/// request that errors or is cancelled mid-pipeline frees capacity
/// automatically.
pub struct PipelineSlot {
    _permit: OwnedSemaphorePermit,
}

/// Bounds the number of uploads in flight and the number of CPU-heavy
/// transforms running at once. The two pools are independent: a request holds
/// its pipeline slot for its whole lifetime and borrows a CPU permit only
/// around each blocking transform.
#[derive(Clone)]
pub struct ConcurrencyGovernor {
    pipeline: Arc<Semaphore>,
    pipeline_slots: usize,
    cpu: Arc<Semaphore>,
}

impl ConcurrencyGovernor {
    pub fn new(pipeline_slots: usize, cpu_workers: usize) -> Self {
        Self {
            pipeline: Arc::new(Semaphore::new(pipeline_slots)),
            pipeline_slots,
            cpu: Arc::new(Semaphore::new(cpu_workers.max(1))),
        }
    }

    /// Wait for a pipeline slot, giving up after `timeout`.
    pub async fn acquire_pipeline(&self, timeout: Duration) -> Result<PipelineSlot, GovernorError> {
        let acquired = tokio::time::timeout(timeout, self.pipeline.clone().acquire_owned()).await;
        match acquired {
            Ok(Ok(permit)) => Ok(PipelineSlot { _permit: permit }),
            Ok(Err(_)) => Err(GovernorError::Closed),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Timed out waiting for a pipeline slot"
                );
                Err(GovernorError::PipelineFull)
            }
        }
    }

    /// Take a pipeline slot only if one is free right now.
    pub fn try_acquire_pipeline(&self) -> Result<PipelineSlot, GovernorError> {
        match self.pipeline.clone().try_acquire_owned() {
            Ok(permit) => Ok(PipelineSlot { _permit: permit }),
            Err(tokio::sync::TryAcquireError::NoPermits) => Err(GovernorError::PipelineFull),
            Err(tokio::sync::TryAcquireError::Closed) => Err(GovernorError::Closed),
        }
    }

    pub fn available_pipeline_slots(&self) -> usize {
        self.pipeline.available_permits()
    }

    pub fn pipeline_capacity(&self) -> usize {
        self.pipeline_slots
    }

    /// Run a CPU-bound closure on the blocking pool, holding a CPU permit for
    /// its duration.
    pub async fn run_cpu<F, T>(&self, f: F) -> Result<T, GovernorError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .cpu
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GovernorError::Closed)?;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        });
        handle
            .await
            .map_err(|e| GovernorError::Task(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn pipeline_slots_are_bounded() {
        let governor = ConcurrencyGovernor::new(2, 1);

        let a = governor
            .acquire_pipeline(Duration::from_millis(50))
            .await
            .unwrap();
        let _b = governor
            .acquire_pipeline(Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(governor.available_pipeline_slots(), 0);

        let denied = governor.acquire_pipeline(Duration::from_millis(50)).await;
        assert!(matches!(denied, Err(GovernorError::PipelineFull)));

        drop(a);
        let _c = governor
            .acquire_pipeline(Duration::from_millis(500))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn try_acquire_does_not_wait() {
        let governor = ConcurrencyGovernor::new(1, 1);
        let held = governor.try_acquire_pipeline().unwrap();
        assert!(matches!(
            governor.try_acquire_pipeline(),
            Err(GovernorError::PipelineFull)
        ));
        drop(held);
        assert!(governor.try_acquire_pipeline().is_ok());
    }

    #[tokio::test]
    async fn dropping_a_slot_frees_capacity() {
        let governor = ConcurrencyGovernor::new(1, 1);
        {
            let _slot = governor
                .acquire_pipeline(Duration::from_millis(50))
                .await
                .unwrap();
            assert_eq!(governor.available_pipeline_slots(), 0);
        }
        assert_eq!(governor.available_pipeline_slots(), 1);
    }

    #[tokio::test]
    async fn run_cpu_returns_the_closure_result() {
        let governor = ConcurrencyGovernor::new(1, 2);
        let out = governor.run_cpu(|| 21 * 2).await.unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn cpu_concurrency_never_exceeds_worker_count() {
        const WORKERS: usize = 3;
        let governor = ConcurrencyGovernor::new(32, WORKERS);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..24 {
            let governor = governor.clone();
            let running = running.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                governor
                    .run_cpu(move || {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(10));
                        running.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= WORKERS);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }
}
