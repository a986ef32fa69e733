//! Periodic trigger for the price pipeline.
//!
//! Fires once at start and then every interval. Each tick runs as its own
//! task, so a slow tick never delays the clock; the pipeline drops ticks
//! that overlap a running one.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use pricefeed_core::{PricePipeline, TickOutcome};

pub struct PriceScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PriceScheduler {
    /// Starts the background scheduler.
    pub fn start(pipeline: Arc<PricePipeline>, every: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!("Price scheduler started ({}s interval)", every.as_secs());

            // First tick is immediate
            let mut ticks = interval(every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let pipeline = pipeline.clone();
                        in_flight.spawn(async move {
                            if let TickOutcome::Skipped = pipeline.run_tick().await {
                                debug!("Scheduled tick skipped");
                            }
                        });
                    }
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(e) = joined {
                            warn!("Scheduled tick task failed: {}", e);
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            // Every spawned tick finishes before the scheduler reports stopped
            while in_flight.join_next().await.is_some() {}
            info!("Price scheduler stopped");
        });

        Self { shutdown, handle }
    }

    /// Stops scheduling and waits for in-flight ticks to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("Price scheduler task ended abnormally: {}", e);
        }
    }
}
