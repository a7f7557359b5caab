//! Bounded fan-out over files.
//!
//! Every per-file pass runs on one [`WorkerPool`]: each file is visited
//! independently, results are gathered in completion order, and files that
//! could not be inspected are logged and dropped.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;

/// How often progress is reported, in files.
pub const PROGRESS_EVERY: usize = 50;

/// Outcome of visiting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit<T> {
    /// The file produced a result.
    Hit(T),
    /// The file was inspected and did not qualify.
    Miss,
    /// The file could not be inspected; the reason is only logged.
    Skipped(String),
}

impl<T> Visit<T> {
    /// Maps an I/O failure to `Skipped` with the path in the reason.
    pub fn skipped(path: &Path, err: impl std::fmt::Display) -> Self {
        Visit::Skipped(format!("{}: {}", path.display(), err))
    }
}

/// Receives "processed N of TOTAL" updates from a pass.
pub trait Progress: Sync {
    fn update(&self, done: usize, total: usize);

    fn finish(&self) {}
}

/// Progress sink that ignores every update.
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&self, _done: usize, _total: usize) {}
}

impl Progress for indicatif::ProgressBar {
    fn update(&self, done: usize, total: usize) {
        self.set_length(total as u64);
        self.set_position(done as u64);
    }

    fn finish(&self) {
        self.finish_and_clear();
    }
}

/// A fixed-size pool of worker threads.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Creates a pool with `workers` threads; `0` uses every available core.
    pub fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("filegod-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Visits every path and returns the hits in completion order.
    pub fn visit<T, F>(&self, paths: &[PathBuf], progress: &dyn Progress, visit: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Path) -> Visit<T> + Sync,
    {
        let total = paths.len();
        let done = AtomicUsize::new(0);

        let hits = self.pool.install(|| {
            paths
                .par_iter()
                .filter_map(|path| {
                    let outcome = visit(path.as_path());

                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if finished % PROGRESS_EVERY == 1 || finished == total {
                        progress.update(finished, total);
                    }

                    match outcome {
                        Visit::Hit(value) => Some(value),
                        Visit::Miss => None,
                        Visit::Skipped(reason) => {
                            tracing::debug!(%reason, "skipping entry");
                            None
                        }
                    }
                })
                .collect::<Vec<_>>()
        });

        progress.finish();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<(usize, usize)>>);

    impl Progress for Recorder {
        fn update(&self, done: usize, total: usize) {
            self.0.lock().unwrap().push((done, total));
        }
    }

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("/f{i}"))).collect()
    }

    #[test]
    fn test_pool_size_is_bounded() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.workers(), 2);
    }

    #[test]
    fn test_visit_keeps_only_hits() {
        let pool = WorkerPool::new(3).unwrap();
        let mut hits = pool.visit(&paths(10), &NoProgress, |path| {
            let n: usize = path.to_string_lossy()[2..].parse().unwrap();
            match n % 3 {
                0 => Visit::Hit(n),
                1 => Visit::Miss,
                _ => Visit::skipped(path, "unreadable"),
            }
        });
        hits.sort();
        assert_eq!(hits, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_progress_reports_first_and_last() {
        let pool = WorkerPool::new(1).unwrap();
        let recorder = Recorder(Mutex::new(Vec::new()));
        pool.visit(&paths(120), &recorder, |_| Visit::<()>::Miss);

        let updates = recorder.0.into_inner().unwrap();
        assert_eq!(updates, vec![(1, 120), (51, 120), (101, 120), (120, 120)]);
    }

    #[test]
    fn test_empty_input() {
        let pool = WorkerPool::new(1).unwrap();
        let hits: Vec<()> = pool.visit(&[], &NoProgress, |_| Visit::Hit(()));
        assert!(hits.is_empty());
    }
}
