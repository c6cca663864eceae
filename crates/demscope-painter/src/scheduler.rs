//! Bounded worker pool that runs DEM loads off the interactive thread.

use crate::error::ManagerError;
use crate::settings::MAX_LOAD_WORKERS;
use tracing::debug;

/// Runs load jobs on a fixed number of named worker threads.
///
/// Jobs are independent and complete in no particular order. The pool
/// lives as long as its owner; dropping it lets queued jobs finish on
/// their own.
pub struct LoadScheduler {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl std::fmt::Debug for LoadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadScheduler").field("workers", &self.workers).finish()
    }
}

impl LoadScheduler {
    /// Start a pool of `workers` threads (at least one).
    pub fn new(workers: usize) -> Result<Self, ManagerError> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("dem-load-{i}"))
            .build()?;
        debug!(workers, "Load scheduler started");
        Ok(Self { pool, workers })
    }

    /// Worker count used when nothing is configured.
    pub fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map_or(1, |n| n.get())
            .min(MAX_LOAD_WORKERS)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue a job. Returns immediately.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    #[test]
    fn test_jobs_run_on_named_workers() {
        let scheduler = LoadScheduler::new(2).unwrap();
        assert_eq!(scheduler.workers(), 2);

        let (tx, rx) = unbounded();
        for i in 0..8 {
            let tx = tx.clone();
            scheduler.submit(move || {
                let name = std::thread::current().name().unwrap_or_default().to_string();
                tx.send((i, name)).unwrap();
            });
        }
        drop(tx);

        let mut seen: Vec<_> = rx.iter().collect();
        seen.sort_by_key(|(i, _)| *i);
        assert_eq!(seen.len(), 8);
        assert!(seen.iter().all(|(_, name)| name.starts_with("dem-load-")));
    }

    #[test]
    fn test_zero_workers_means_one() {
        let scheduler = LoadScheduler::new(0).unwrap();
        assert_eq!(scheduler.workers(), 1);

        let (tx, rx) = unbounded();
        scheduler.submit(move || tx.send(()).unwrap());
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_default_workers_bounded() {
        let n = LoadScheduler::default_workers();
        assert!((1..=MAX_LOAD_WORKERS).contains(&n));
    }
}
