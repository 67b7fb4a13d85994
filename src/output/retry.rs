//! Bounded retry for transient filesystem failures.

use std::io;
use std::thread;
use std::time::Duration;

/// Retry policy: `1 + max_retries` attempts with a fixed delay in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Policy for deleting the output directory (antivirus locks, open handles).
    pub const DELETE: Self = Self {
        max_retries: 3,
        delay: Duration::from_millis(100),
    };

    pub const fn attempts(self) -> u32 {
        self.max_retries + 1
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// On failure returns the number of attempts made and the last error.
    pub fn run<T>(self, mut op: impl FnMut() -> io::Result<T>) -> Result<T, (u32, io::Error)> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.attempts() => return Err((attempt, err)),
                Err(err) => {
                    crate::debug!("clean"; "attempt {} failed: {}, retrying", attempt, err);
                    thread::sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}
