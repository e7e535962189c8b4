//! Sunset watcher: the polling driver that asks the gate every tick.
//!
//! Each tick takes the current config snapshot and calls
//! [`DuskService::trigger`] for every device. The gate and the firing
//! ledger decide whether anything happens, so a tick interval shorter than
//! the trigger window is safe.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use twilight_domain::config::LightingConfig;
use twilight_domain::error::TwilightError;
use twilight_domain::plan::DuskStrategy;
use twilight_domain::time::{self, Timestamp};

use crate::cancel::CancelToken;
use crate::ports::{FiringLedger, LightingClient, SunEventProvider};
use crate::services::dusk_service::{DuskService, TriggerOutcome};

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub started: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Periodic driver for automatic dusk triggers.
pub struct SunsetWatcher<C, S, L> {
    dusk: DuskService<C, S, L>,
    config: watch::Receiver<Arc<LightingConfig>>,
    interval: Duration,
    strategy: DuskStrategy,
}

impl<C, S, L> SunsetWatcher<C, S, L>
where
    C: LightingClient + 'static,
    S: SunEventProvider,
    L: FiringLedger,
{
    #[must_use]
    pub fn new(
        dusk: DuskService<C, S, L>,
        config: watch::Receiver<Arc<LightingConfig>>,
        interval: Duration,
        strategy: DuskStrategy,
    ) -> Self {
        Self {
            dusk,
            config,
            interval,
            strategy,
        }
    }

    /// Tick until `shutdown` is cancelled.
    pub async fn run(self, mut shutdown: CancelToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            strategy = %self.strategy,
            "sunset watcher started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(time::now()).await;
                }
                () = shutdown.cancelled() => break,
            }
        }
        tracing::info!("sunset watcher stopped");
    }

    /// Evaluate every configured device once.
    pub async fn tick(&self, now: Timestamp) -> TickSummary {
        let config = Arc::clone(&self.config.borrow());
        let mut summary = TickSummary::default();

        for device in &config.devices {
            match self
                .dusk
                .trigger(&config, &device.name, self.strategy, false, now)
                .await
            {
                Ok(TriggerOutcome::Started { run }) => {
                    summary.started += 1;
                    tracing::info!(device = %device.name, run_id = %run.run_id, "sunset trigger fired");
                }
                Ok(TriggerOutcome::Skipped { .. }) | Err(TwilightError::Conflict(_)) => {
                    summary.skipped += 1;
                }
                Err(TwilightError::SunCalc(err)) => {
                    summary.skipped += 1;
                    tracing::debug!(device = %device.name, error = %err, "no sunset, not firing");
                }
                Err(err) => {
                    summary.failed += 1;
                    tracing::warn!(device = %device.name, error = %err, "sunset trigger failed");
                }
            }
        }
        summary
    }
}
