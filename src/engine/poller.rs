//! Cancellable periodic refresh.
//!
//! DESIGN
//! ======
//! A poll is a spawned loop on a `tokio::time::interval` whose first tick is
//! one period after start. Missed ticks are skipped rather than replayed. The
//! loop stops when the tick callback returns `false` (its owner is gone) or
//! when the `PollHandle` is dropped, which aborts the task.

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Owns a running poll loop; dropping it stops the loop.
#[derive(Debug)]
pub struct PollHandle {
    period: Duration,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Call `tick` every `period` until it resolves to `false`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if !tick().await {
                    break;
                }
            }
        });
        Self { period, task }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the loop now.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
