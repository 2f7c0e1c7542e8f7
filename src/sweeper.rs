//! Background trash sweep
//!
//! A tokio task that calls [`Core::sweep`] on a fixed interval. The sweep takes
//! the same lock as every other operation, so it runs between mutations.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::handle::Core;

/// Owns the running sweep task; stopping or dropping it ends the timer
#[derive(Debug)]
pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn shutdown(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Starts sweeping every `period`, the first pass one full period from now.
///
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper(core: Core, period: Duration) -> SweeperHandle {
    let handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(?period, "trash sweeper started");
        loop {
            ticker.tick().await;
            core.sweep();
        }
    });

    SweeperHandle { handle }
}
