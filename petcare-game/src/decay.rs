//! Periodic hunger/hygiene decay.
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Cancellable fixed-interval task. The first tick fires one full period
/// after arming. The task stops itself when `tick` returns `false`, and is
/// aborted when the timer is cancelled or dropped.
#[derive(Debug)]
pub(crate) struct DecayTimer {
    handle: JoinHandle<()>,
}

impl DecayTimer {
    pub(crate) fn arm<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !tick() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Safe to call any number of times.
    pub(crate) fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for DecayTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
