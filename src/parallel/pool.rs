//! Rayon thread pool configuration for batch workloads.
//!
//! A single battle already runs one OS thread per player; this pool only
//! governs how many *battles* run at once in batch mode.

use rayon::ThreadPoolBuilder;

/// Configures how many batch workers run battles concurrently.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use Rayon default (num_cpus).
    pub workers: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self {
            workers: 0, // Rayon default
        }
    }
}

impl WorkerPool {
    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run a closure on a thread pool with this worker count. If
    /// [workers](WorkerPool::workers) is 0, uses the global Rayon pool;
    /// otherwise builds a temporary pool with that many threads.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            f()
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .expect("Rayon thread pool");
            pool.install(f)
        }
    }
}
