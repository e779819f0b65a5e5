//! Bounded execution of CPU-bound transforms
//!
//! Codec work runs on tokio's blocking pool; a semaphore caps how many
//! transforms decode and encode at the same time.

use crate::error::TransformError;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct TransformPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl TransformPool {
    /// A pool of `size` concurrent transforms (at least one)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Transforms that could start right now without waiting
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on the blocking pool once a permit is free.
    ///
    /// Anything the job owns is dropped on its thread, so a panicking job still
    /// releases its resources. The panic surfaces as [`TransformError::Worker`].
    pub async fn run<F, T>(&self, job: F) -> Result<T, TransformError>
    where
        F: FnOnce() -> Result<T, TransformError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| TransformError::Worker(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Transform task failed");
            TransformError::Worker(e.to_string())
        })?
    }
}

impl Default for TransformPool {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(cores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::TempFile;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_job_result() {
        let pool = TransformPool::new(2);
        let value = pool.run(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_job_error_is_passed_through() {
        let pool = TransformPool::new(1);
        let err = pool
            .run(|| -> Result<(), TransformError> { Err(TransformError::InvalidDimensions) })
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidDimensions));
    }

    #[tokio::test]
    async fn test_panicking_job_maps_to_worker_error_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.png");
        std::fs::write(&path, b"data").unwrap();

        let pool = TransformPool::new(1);
        let temp = TempFile::new(&path);
        let err = pool
            .run(move || -> Result<(), TransformError> {
                let _owned = temp;
                panic!("decoder exploded");
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TransformError::Worker(_)));
        assert!(!path.exists());
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let pool = TransformPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let pool = pool.clone();
            let running = running.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_size_is_at_least_one() {
        assert_eq!(TransformPool::new(0).size(), 1);
    }
}
