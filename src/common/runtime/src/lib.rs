//! Execution runtime utilities for sift.
//!
//! Provides the process-wide implicit-parallelism switch and the compute
//! pool used by the parallel execution driver.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::{ThreadPool, ThreadPoolBuilder};

use common_error::{SiftError, SiftResult};

static IMPLICIT_PARALLELISM: AtomicBool = AtomicBool::new(false);
static REQUESTED_WORKERS: AtomicUsize = AtomicUsize::new(0);

/// Turn on implicit parallelism for passes started after this call.
///
/// `workers == 0` requests one worker per available CPU. The flags are read
/// once when a pass starts; changes mid-pass have no effect on it.
pub fn enable_implicit_parallelism(workers: usize) {
    REQUESTED_WORKERS.store(workers, Ordering::Relaxed);
    IMPLICIT_PARALLELISM.store(true, Ordering::Relaxed);
}

/// Turn implicit parallelism back off.
pub fn disable_implicit_parallelism() {
    IMPLICIT_PARALLELISM.store(false, Ordering::Relaxed);
}

/// Check whether implicit parallelism is currently enabled.
pub fn is_implicit_parallelism_enabled() -> bool {
    IMPLICIT_PARALLELISM.load(Ordering::Relaxed)
}

/// Number of workers a parallel pass started now would use.
pub fn implicit_worker_count() -> usize {
    let requested = REQUESTED_WORKERS.load(Ordering::Relaxed);
    if requested > 0 {
        requested
    } else {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1)
    }
}

/// A dedicated pool of worker threads for CPU-bound passes.
///
/// Thin wrapper over a rayon [`ThreadPool`]; one pool is built per parallel
/// pass with the worker count fixed at pass start.
pub struct ComputePool {
    pool: ThreadPool,
}

impl ComputePool {
    /// Build a pool with exactly `threads` workers.
    pub fn new(threads: usize) -> SiftResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sift-worker-{i}"))
            .build()
            .map_err(|e| SiftError::internal(format!("failed to build worker pool: {e}")))?;
        Ok(Self { pool })
    }

    /// Number of worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Execute a closure inside the pool, blocking until it returns.
    ///
    /// Scoped spawns issued from within the closure run on pool threads.
    pub fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(f)
    }
}
