//! Dusk service: gate, plan and start a transition for one device.
//!
//! Evaluation and planning happen inline and are fast. Playback runs in a
//! background task registered in the [`RunTable`], so the caller (an HTTP
//! handler, the sunset watcher) never waits for a transition that can last
//! hours.

use std::sync::Arc;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::Instrument;

use twilight_domain::config::LightingConfig;
use twilight_domain::device::DeviceTarget;
use twilight_domain::error::{NotFoundError, TwilightError};
use twilight_domain::gate::{GateDecision, TriggerGate};
use twilight_domain::plan::DuskStrategy;
use twilight_domain::planner::Planner;
use twilight_domain::time::{self, Timestamp};

use crate::player::TransitionPlayer;
use crate::ports::{FiringLedger, LightingClient, SunEventProvider};
use crate::run_table::{RunInfo, RunTable};
use crate::services::config_service::ReloadReport;

/// Result of a trigger request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// A background run was started.
    Started { run: RunInfo },
    /// The gate stayed closed.
    Skipped { reason: GateDecision },
}

/// Application service driving dusk transitions.
pub struct DuskService<C, S, L> {
    player: TransitionPlayer<C>,
    sun: Arc<S>,
    ledger: Arc<L>,
    runs: RunTable,
    gate: TriggerGate,
}

impl<C, S, L> Clone for DuskService<C, S, L> {
    fn clone(&self) -> Self {
        Self {
            player: self.player.clone(),
            sun: Arc::clone(&self.sun),
            ledger: Arc::clone(&self.ledger),
            runs: self.runs.clone(),
            gate: self.gate,
        }
    }
}

impl<C, S, L> DuskService<C, S, L>
where
    C: LightingClient + 'static,
    S: SunEventProvider,
    L: FiringLedger,
{
    #[must_use]
    pub fn new(
        player: TransitionPlayer<C>,
        sun: Arc<S>,
        ledger: Arc<L>,
        runs: RunTable,
        gate: TriggerGate,
    ) -> Self {
        Self {
            player,
            sun,
            ledger,
            runs,
            gate,
        }
    }

    #[must_use]
    pub fn runs(&self) -> &RunTable {
        &self.runs
    }

    /// Evaluate the gate for `device_name` and, when open, start a run.
    ///
    /// With `force` the sunset window and the daily marker are skipped; the
    /// one-run-per-device rule still applies and no marker is written.
    ///
    /// # Errors
    ///
    /// - [`TwilightError::NotFound`] when no device has that name.
    /// - [`TwilightError::SunCalc`] when the sunset cannot be computed; the
    ///   trigger does not fire.
    /// - [`TwilightError::InvalidProfile`] when planning fails; nothing is sent.
    /// - [`TwilightError::Conflict`] when the device already runs a transition.
    /// - [`TwilightError::Storage`] when the firing ledger fails.
    #[tracing::instrument(skip(self, config))]
    pub async fn trigger(
        &self,
        config: &LightingConfig,
        device_name: &str,
        strategy: DuskStrategy,
        force: bool,
        now: Timestamp,
    ) -> Result<TriggerOutcome, TwilightError> {
        let device = config.find_device(device_name).ok_or_else(|| NotFoundError {
            entity: "Device",
            id: device_name.to_string(),
        })?;
        let tz = device.timezone();
        let today = time::local_date(now, tz);

        if !force {
            let decision = self.evaluate(device, now, today).await?;
            if !decision.is_fire() {
                tracing::debug!(?decision, "trigger skipped");
                return Ok(TriggerOutcome::Skipped { reason: decision });
            }
        }

        let plan = {
            let mut rng = StdRng::from_entropy();
            Planner::new(config.default_color).plan(
                strategy,
                &config.dusk,
                device,
                time::until_next_midnight(now, tz),
                &mut rng,
            )?
        };

        let (run, mut cancel) = self.runs.reserve(&device.name, &device.id, strategy, now)?;

        if !force {
            match self.ledger.claim(&device.id, today, now).await {
                Ok(true) => {}
                Ok(false) => {
                    self.runs.finish(&device.id, run.run_id);
                    tracing::debug!("another trigger claimed today first");
                    return Ok(TriggerOutcome::Skipped {
                        reason: GateDecision::AlreadyFired,
                    });
                }
                Err(err) => {
                    self.runs.finish(&device.id, run.run_id);
                    return Err(err);
                }
            }
        }

        tracing::info!(
            run_id = %run.run_id,
            commands = plan.len(),
            total_dwell_secs = plan.total_dwell().as_secs(),
            force,
            "dusk transition started"
        );

        let player = self.player.clone();
        let token = config.token.clone();
        let run_id = run.run_id;
        let finished = self.runs.guard(device.id.clone(), run_id);
        let span = tracing::info_span!("run", %run_id, device = %device.name);
        tokio::spawn(
            async move {
                let _finished = finished;
                match player
                    .execute(&token, &plan, strategy.delivery(), &mut cancel)
                    .await
                {
                    Ok(outcome) => tracing::info!(?outcome, "run finished"),
                    Err(TwilightError::Dispatch(err)) => tracing::error!(
                        step = err.step_index,
                        cause = %err.source,
                        "run aborted, remaining commands dropped"
                    ),
                    Err(err) => tracing::error!(error = %err, "run aborted"),
                }
            }
            .instrument(span),
        );

        Ok(TriggerOutcome::Started { run })
    }

    async fn evaluate(
        &self,
        device: &DeviceTarget,
        now: Timestamp,
        today: NaiveDate,
    ) -> Result<GateDecision, TwilightError> {
        let coordinates = device.sun_coordinates()?;
        let sunset = self.sun.sunset(coordinates, today, device.timezone())?;
        let last_fired = self.ledger.last_fired(&device.id).await?;
        let decision = self.gate.evaluate(&now, &sunset, last_fired, today);
        tracing::trace!(%sunset, ?last_fired, ?decision, "gate evaluated");
        Ok(decision)
    }

    /// Cancel the run of `device_name`.
    ///
    /// # Errors
    ///
    /// Returns [`TwilightError::NotFound`] when the device is unknown or idle.
    pub fn cancel(
        &self,
        config: &LightingConfig,
        device_name: &str,
    ) -> Result<RunInfo, TwilightError> {
        let not_found = |entity| NotFoundError {
            entity,
            id: device_name.to_string(),
        };
        let device = config
            .find_device(device_name)
            .ok_or_else(|| not_found("Device"))?;
        let run = self.runs.cancel(&device.id).ok_or_else(|| not_found("Run"))?;
        tracing::info!(run_id = %run.run_id, device = device_name, "run cancellation requested");
        Ok(run)
    }

    /// Cancel the runs a reload made stale.
    pub fn apply_reload(&self, report: &ReloadReport) -> Vec<RunInfo> {
        let cancelled: Vec<RunInfo> = report
            .stale
            .iter()
            .filter_map(|selector| self.runs.cancel(selector))
            .collect();
        for run in &cancelled {
            tracing::info!(run_id = %run.run_id, device = %run.device, "run cancelled by reload");
        }
        cancelled
    }

    /// Cancel everything and wait for the tasks to acknowledge.
    pub async fn shutdown(&self) {
        let cancelled = self.runs.cancel_all();
        if !cancelled.is_empty() {
            tracing::info!(runs = cancelled.len(), "cancelling active runs");
        }
        self.runs.wait_idle().await;
    }
}
