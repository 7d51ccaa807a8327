//! Fixed-period cycle driver.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::Engine;

/// Default wait between cycles.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(60);

/// Default wait before the first cycle, leaving the process time to finish
/// wiring its transport before notifications start.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(10);

/// Drives [`Engine::run_cycle`] on a fixed period.
///
/// The loop is a single task that awaits each cycle to completion, so two
/// cycles can never overlap; a cycle that outruns the period delays the
/// next tick instead of bursting.
pub struct Scheduler {
    engine: Arc<Engine>,
    period: Duration,
    initial_delay: Duration,
}

impl Scheduler {
    #[must_use]
    pub const fn new(engine: Arc<Engine>, period: Duration, initial_delay: Duration) -> Self {
        Self {
            engine,
            period,
            initial_delay,
        }
    }

    /// Spawns the polling loop onto the runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs cycles forever. Fetch and flush failures are logged and the
    /// loop keeps going; the next tick retries from the last committed
    /// baseline.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.initial_delay, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!(
            "Polling every {:?} (first cycle in {:?})",
            self.period,
            self.initial_delay
        );

        loop {
            ticker.tick().await;
            match self.engine.run_cycle().await {
                Ok(report) => {
                    if report.events > 0 {
                        log::info!(
                            "Cycle complete: {} active, {} change(s), {} delivered, {} failed",
                            report.active,
                            report.events,
                            report.delivery.delivered,
                            report.delivery.failed
                        );
                    } else {
                        log::debug!("Cycle complete: {} active, no changes", report.active);
                    }
                }
                Err(e) => log::error!("Cycle failed: {e}"),
            }
        }
    }
}
