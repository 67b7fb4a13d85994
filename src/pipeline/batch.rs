//! Fixed-window batch scheduler.
//!
//! Items are split into consecutive windows of `window` items. Each window
//! runs in parallel on a dedicated pool of `window` threads and must fully
//! settle before the next one starts:
//!
//! ```text
//! items:  [0 1 2 3 4 5 6 7 8 9 | 10 11 12 ... 19 | 20 ...]
//!          └──── window 0 ────┘  └─ window 1 ──┘
//!                 barrier ──────┘          barrier ┘
//! ```
//!
//! A failure in window `i` lets its siblings finish, then stops: window
//! `i + 1` is never started. The first error in item order is reported.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Default number of file operations in flight.
pub const DEFAULT_WINDOW: usize = 10;

/// Why a batch run stopped early.
#[derive(Debug)]
pub enum BatchFailure<E> {
    /// An item failed; `batch` is the index of the window it belonged to.
    Failed { batch: usize, error: E },
    /// `should_stop` returned true before a window was started.
    Interrupted { completed: usize },
}

pub struct BatchScheduler {
    window: usize,
    pool: ThreadPool,
}

impl BatchScheduler {
    /// Create a scheduler with at most `window` operations in flight (minimum 1).
    pub fn new(window: usize) -> Result<Self, ThreadPoolBuildError> {
        let window = window.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(window)
            .thread_name(|i| format!("prezip-worker-{i}"))
            .build()?;
        Ok(Self { window, pool })
    }

    pub const fn window(&self) -> usize {
        self.window
    }

    /// Run `op` over every item, window by window.
    ///
    /// `should_stop` is polled before each window. Returns the outputs in item order.
    pub fn run<T, R, E, F, S>(
        &self,
        items: &[T],
        op: F,
        should_stop: S,
    ) -> Result<Vec<R>, BatchFailure<E>>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync,
        S: Fn() -> bool,
    {
        let mut outputs = Vec::with_capacity(items.len());

        for (batch, chunk) in items.chunks(self.window).enumerate() {
            if should_stop() {
                return Err(BatchFailure::Interrupted {
                    completed: outputs.len(),
                });
            }

            // All items settle before any error is looked at
            let settled: Vec<Result<R, E>> =
                self.pool.install(|| chunk.par_iter().map(&op).collect());

            let mut first_error = None;
            for result in settled {
                match result {
                    Ok(value) => outputs.push(value),
                    Err(error) => {
                        first_error.get_or_insert(error);
                    }
                }
            }

            if let Some(error) = first_error {
                crate::debug!("batch"; "window {} failed, stopping", batch);
                return Err(BatchFailure::Failed { batch, error });
            }
        }

        Ok(outputs)
    }
}
