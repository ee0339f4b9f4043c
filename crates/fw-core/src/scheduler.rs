//! Fixed-interval trigger for detection cycles.
//!
//! - First cycle runs immediately at start
//! - Missed ticks (a cycle that overran the interval) are skipped, not bursted
//! - A failed cycle never stops the loop; only cancellation does

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::monitor::{CycleOutcome, FlightMonitor};

pub struct PollScheduler {
    monitor: Arc<FlightMonitor>,
    interval: Duration,
    cancel: CancellationToken,
}

impl PollScheduler {
    pub fn new(monitor: Arc<FlightMonitor>, interval: Duration) -> Self {
        Self {
            monitor,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "polling started");

        let mut tick = tokio::time::interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
              _ = self.cancel.cancelled() => break,
              _ = tick.tick() => {
                if let CycleOutcome::FetchFailed(e) = self.monitor.run_cycle().await {
                  warn!(error = %e, "flight check failed; retrying next interval");
                }
              }
            }
        }

        info!("polling stopped");
    }
}
