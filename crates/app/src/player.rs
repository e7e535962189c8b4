//! Transition player: delivers a [`TransitionPlan`] to the lighting client.
//!
//! Two delivery modes:
//! - **stepped**: one call per command, suspending between calls for the
//!   command's dwell. Runs for as long as the transition lasts, so callers
//!   spawn it as a background task and keep its [`CancelHandle`](crate::cancel::CancelHandle).
//! - **batch**: one cycle call carrying the whole plan; returns as soon as
//!   the remote API accepted it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use twilight_domain::command::LightCommand;
use twilight_domain::error::{DispatchError, TwilightError};
use twilight_domain::plan::{DeliveryMode, TransitionPlan};

use crate::cancel::CancelToken;
use crate::ports::LightingClient;

/// Tuning knobs for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOptions {
    /// Extra attempts per command before the run aborts.
    pub retries: u32,
    /// Pause between two attempts of the same command.
    pub retry_delay: Duration,
    /// Send the plan's closing power-off when a stepped run is cancelled.
    pub power_off_on_cancel: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay: Duration::from_secs(5),
            power_off_on_cancel: false,
        }
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlaybackOutcome {
    /// Every command was sent one by one.
    Completed { sent: usize },
    /// The whole plan was handed to the remote cycle.
    Submitted { states: usize },
    /// Stopped early; `sent` commands had already been delivered.
    Cancelled { sent: usize },
}

/// Executes plans against a [`LightingClient`].
pub struct TransitionPlayer<C> {
    client: Arc<C>,
    options: PlayerOptions,
}

impl<C> Clone for TransitionPlayer<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            options: self.options,
        }
    }
}

impl<C: LightingClient> TransitionPlayer<C> {
    #[must_use]
    pub fn new(client: Arc<C>, options: PlayerOptions) -> Self {
        Self { client, options }
    }

    /// Deliver `plan` using `mode`.
    ///
    /// # Errors
    ///
    /// - [`TwilightError::Capacity`] when a batch plan exceeds the remote cap;
    ///   nothing is sent.
    /// - [`TwilightError::Dispatch`] carrying the failed command's index once
    ///   every attempt failed. Commands already sent are not rolled back.
    #[tracing::instrument(
        skip_all,
        fields(selector = %plan.selector(), strategy = %plan.strategy(), mode = ?mode, commands = plan.len())
    )]
    pub async fn execute(
        &self,
        token: &str,
        plan: &TransitionPlan,
        mode: DeliveryMode,
        cancel: &mut CancelToken,
    ) -> Result<PlaybackOutcome, TwilightError> {
        match mode {
            DeliveryMode::Stepped => self.play_stepped(token, plan, cancel).await,
            DeliveryMode::Batch => self.play_batch(token, plan, cancel).await,
        }
    }

    async fn play_stepped(
        &self,
        token: &str,
        plan: &TransitionPlan,
        cancel: &mut CancelToken,
    ) -> Result<PlaybackOutcome, TwilightError> {
        for (index, planned) in plan.commands().iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(self.abort(token, plan, index).await);
            }
            let sent = self
                .with_retry(index, cancel, || self.client.put_state(token, &planned.command))
                .await?;
            if sent.is_none() {
                return Ok(self.abort(token, plan, index).await);
            }
            tracing::debug!(
                step = index,
                color = %planned.command.color,
                brightness = planned.command.brightness,
                "command sent"
            );

            let dwell = planned.sleep_after();
            if dwell.is_zero() {
                continue;
            }
            tokio::select! {
                () = tokio::time::sleep(dwell) => {}
                () = cancel.cancelled() => return Ok(self.abort(token, plan, index + 1).await),
            }
        }
        Ok(PlaybackOutcome::Completed { sent: plan.len() })
    }

    async fn play_batch(
        &self,
        token: &str,
        plan: &TransitionPlan,
        cancel: &mut CancelToken,
    ) -> Result<PlaybackOutcome, TwilightError> {
        plan.ensure_fits_cycle()?;
        if cancel.is_cancelled() {
            return Ok(PlaybackOutcome::Cancelled { sent: 0 });
        }
        let states: Vec<LightCommand> = plan.light_commands().cloned().collect();
        let submitted = self
            .with_retry(0, cancel, || {
                self.client.post_cycle(token, plan.selector(), &states)
            })
            .await?;
        Ok(match submitted {
            Some(()) => PlaybackOutcome::Submitted {
                states: states.len(),
            },
            None => PlaybackOutcome::Cancelled { sent: 0 },
        })
    }

    /// Run `call` up to `1 + retries` times. `Ok(None)` means the run was
    /// cancelled while waiting to retry.
    async fn with_retry<T, F, Fut>(
        &self,
        step_index: usize,
        cancel: &mut CancelToken,
        mut call: F,
    ) -> Result<Option<T>, DispatchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TwilightError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(Some(value)),
                Err(err) if attempt < self.options.retries => {
                    attempt += 1;
                    tracing::warn!(step = step_index, attempt, error = %err, "command failed, retrying");
                    tokio::select! {
                        () = tokio::time::sleep(self.options.retry_delay) => {}
                        () = cancel.cancelled() => return Ok(None),
                    }
                }
                Err(err) => {
                    return Err(DispatchError {
                        step_index,
                        source: Box::new(err),
                    });
                }
            }
        }
    }

    async fn abort(&self, token: &str, plan: &TransitionPlan, sent: usize) -> PlaybackOutcome {
        tracing::info!(sent, "run cancelled");
        if self.options.power_off_on_cancel && plan.ends_with_power_off() {
            if let Some(off) = plan.commands().last() {
                if let Err(err) = self.client.put_state(token, &off.command).await {
                    tracing::warn!(error = %err, "safety power-off failed");
                }
            }
        }
        PlaybackOutcome::Cancelled { sent }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use chrono::TimeDelta;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Mutex;
    use twilight_domain::color::Kelvin;
    use twilight_domain::command::{Power, Selector};
    use twilight_domain::device::DeviceTarget;
    use twilight_domain::dusk::DuskProfile;
    use twilight_domain::error::CapacityError;
    use twilight_domain::plan::DuskStrategy;
    use twilight_domain::planner::Planner;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Put(LightCommand),
        Cycle(Selector, Vec<LightCommand>),
        Toggle(Selector),
        List(Selector),
    }

    /// Records every attempted call. Put attempts whose 0-based index is in
    /// `failing` return an error.
    #[derive(Default)]
    pub(crate) struct SpyClient {
        pub(crate) calls: Mutex<Vec<Call>>,
        pub(crate) failing: Mutex<Vec<usize>>,
        pub(crate) fail_cycle: Mutex<bool>,
        put_attempts: Mutex<usize>,
    }

    impl SpyClient {
        pub(crate) fn failing_on(attempts: &[usize]) -> Self {
            let spy = Self::default();
            *spy.failing.lock().unwrap() = attempts.to_vec();
            spy
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn puts(&self) -> Vec<LightCommand> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Put(cmd) => Some(cmd),
                    _ => None,
                })
                .collect()
        }
    }

    impl LightingClient for SpyClient {
        fn put_state(
            &self,
            _token: &str,
            command: &LightCommand,
        ) -> impl Future<Output = Result<(), TwilightError>> + Send {
            self.calls.lock().unwrap().push(Call::Put(command.clone()));
            let mut attempts = self.put_attempts.lock().unwrap();
            let fails = self.failing.lock().unwrap().contains(&*attempts);
            *attempts += 1;
            async move {
                if fails {
                    Err(TwilightError::Client("remote returned 503".into()))
                } else {
                    Ok(())
                }
            }
        }

        fn post_cycle(
            &self,
            _token: &str,
            selector: &Selector,
            states: &[LightCommand],
        ) -> impl Future<Output = Result<(), TwilightError>> + Send {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Cycle(selector.clone(), states.to_vec()));
            let fails = *self.fail_cycle.lock().unwrap();
            async move {
                if fails {
                    Err(TwilightError::Client("remote returned 500".into()))
                } else {
                    Ok(())
                }
            }
        }

        fn toggle(
            &self,
            _token: &str,
            selector: &Selector,
        ) -> impl Future<Output = Result<(), TwilightError>> + Send {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Toggle(selector.clone()));
            async { Ok(()) }
        }

        fn list_lights(
            &self,
            _token: &str,
            selector: &Selector,
        ) -> impl Future<Output = Result<serde_json::Value, TwilightError>> + Send {
            self.calls.lock().unwrap().push(Call::List(selector.clone()));
            let body = serde_json::json!([{ "id": selector.as_str(), "power": "on" }]);
            async move { Ok(body) }
        }
    }

    fn profile(steps: u32) -> DuskProfile {
        DuskProfile {
            color_start: Kelvin::new(2200),
            color_end: Kelvin::new(4000),
            steps,
            duration_minutes: 40,
            turn_off_jitter_minutes: 10,
        }
    }

    fn plan(strategy: DuskStrategy, steps: u32) -> TransitionPlan {
        let target = DeviceTarget::new(Selector::new("id:d073d5000001"), "Living");
        Planner::new(Kelvin::new(3000))
            .plan(
                strategy,
                &profile(steps),
                &target,
                TimeDelta::hours(4),
                &mut StdRng::seed_from_u64(11),
            )
            .unwrap()
    }

    fn player(client: &Arc<SpyClient>, options: PlayerOptions) -> TransitionPlayer<SpyClient> {
        TransitionPlayer::new(Arc::clone(client), options)
    }

    #[tokio::test(start_paused = true)]
    async fn should_send_every_command_in_order_when_stepped() {
        let client = Arc::new(SpyClient::default());
        let plan = plan(DuskStrategy::Stepped, 4);
        let (_handle, mut token) = cancel_pair();
        let started = tokio::time::Instant::now();

        let outcome = player(&client, PlayerOptions::default())
            .execute("t", &plan, DeliveryMode::Stepped, &mut token)
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Completed { sent: 5 });
        let sent = client.puts();
        let expected: Vec<LightCommand> = plan.light_commands().cloned().collect();
        assert_eq!(sent, expected);
        assert!(started.elapsed() >= plan.total_dwell());
    }

    #[tokio::test(start_paused = true)]
    async fn should_abort_remaining_steps_when_dispatch_fails() {
        let client = Arc::new(SpyClient::failing_on(&[2]));
        let plan = plan(DuskStrategy::Stepped, 4);
        let (_handle, mut token) = cancel_pair();

        let err = player(&client, PlayerOptions::default())
            .execute("t", &plan, DeliveryMode::Stepped, &mut token)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TwilightError::Dispatch(DispatchError { step_index: 2, .. })
        ));
        assert_eq!(client.puts().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn should_retry_failed_command_when_retries_configured() {
        let client = Arc::new(SpyClient::failing_on(&[1]));
        let plan = plan(DuskStrategy::Stepped, 4);
        let (_handle, mut token) = cancel_pair();
        let options = PlayerOptions {
            retries: 1,
            retry_delay: Duration::from_secs(2),
            power_off_on_cancel: false,
        };

        let outcome = player(&client, options)
            .execute("t", &plan, DeliveryMode::Stepped, &mut token)
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Completed { sent: 5 });
        let puts = client.puts();
        assert_eq!(puts.len(), 6);
        assert_eq!(puts[1], puts[2]);
    }

    #[tokio::test]
    async fn should_post_cycle_once_with_all_states_when_batch() {
        let client = Arc::new(SpyClient::default());
        let plan = plan(DuskStrategy::Beta, 8);
        let (_handle, mut token) = cancel_pair();

        let outcome = player(&client, PlayerOptions::default())
            .execute("t", &plan, DeliveryMode::Batch, &mut token)
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Submitted { states: 10 });
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let expected: Vec<LightCommand> = plan.light_commands().cloned().collect();
        assert_eq!(
            calls[0],
            Call::Cycle(Selector::new("id:d073d5000001"), expected)
        );
    }

    #[tokio::test]
    async fn should_fail_with_capacity_error_when_batch_exceeds_cap() {
        let client = Arc::new(SpyClient::default());
        let plan = plan(DuskStrategy::Stepped, 50);
        let (_handle, mut token) = cancel_pair();

        let err = player(&client, PlayerOptions::default())
            .execute("t", &plan, DeliveryMode::Batch, &mut token)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TwilightError::Capacity(CapacityError { len: 51, max: 50 })
        ));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn should_report_dispatch_error_at_index_zero_when_cycle_fails() {
        let client = Arc::new(SpyClient::default());
        *client.fail_cycle.lock().unwrap() = true;
        let plan = plan(DuskStrategy::Beta, 8);
        let (_handle, mut token) = cancel_pair();

        let err = player(&client, PlayerOptions::default())
            .execute("t", &plan, DeliveryMode::Batch, &mut token)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TwilightError::Dispatch(DispatchError { step_index: 0, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_before_next_sleep_elapses_when_cancelled() {
        let client = Arc::new(SpyClient::default());
        let plan = plan(DuskStrategy::Stepped, 4);
        let (handle, mut token) = cancel_pair();
        let options = PlayerOptions {
            power_off_on_cancel: true,
            ..PlayerOptions::default()
        };
        let player = player(&client, options);

        let run = tokio::spawn(async move {
            player
                .execute("t", &plan, DeliveryMode::Stepped, &mut token)
                .await
        });
        while client.puts().is_empty() {
            tokio::task::yield_now().await;
        }
        handle.cancel();

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome, PlaybackOutcome::Cancelled { sent: 1 });
        let puts = client.puts();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[1].power, Power::Off);
    }

    #[tokio::test]
    async fn should_send_nothing_when_cancelled_before_start() {
        let client = Arc::new(SpyClient::default());
        let plan = plan(DuskStrategy::Stepped, 4);
        let (handle, mut token) = cancel_pair();
        handle.cancel();

        let outcome = player(&client, PlayerOptions::default())
            .execute("t", &plan, DeliveryMode::Stepped, &mut token)
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Cancelled { sent: 0 });
        assert!(client.calls().is_empty());
    }
}
