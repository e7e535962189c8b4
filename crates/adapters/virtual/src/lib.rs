//! # twilight-adapter-virtual
//!
//! Virtual lighting client that simulates the remote API in memory.
//!
//! Every call is appended to a history and applied to a per-selector
//! [`VirtualLight`]. The daemon uses it for `dry_run`; tests use it to
//! observe what the scheduler sent.
//!
//! ## Dependency rule
//!
//! Depends on `twilight-app` (port traits) and `twilight-domain` only.

mod light;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use twilight_app::ports::LightingClient;
use twilight_domain::color::Kelvin;
use twilight_domain::command::{LightCommand, Selector};
use twilight_domain::error::TwilightError;

pub use light::VirtualLight;

/// One call as the virtual API received it.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    State(LightCommand),
    Cycle {
        selector: Selector,
        states: Vec<LightCommand>,
    },
    Toggle(Selector),
    List(Selector),
}

/// Error returned for injected failures.
#[derive(Debug, thiserror::Error)]
#[error("virtual lighting API rejected the call")]
pub struct VirtualFailure;

#[derive(Default)]
struct State {
    lights: HashMap<Selector, VirtualLight>,
    history: Vec<RecordedCall>,
    failures: usize,
}

/// In-memory [`LightingClient`].
pub struct VirtualLightingClient {
    default_color: Kelvin,
    state: Mutex<State>,
}

impl Default for VirtualLightingClient {
    fn default() -> Self {
        Self::new(Kelvin::new(2700))
    }
}

impl VirtualLightingClient {
    /// Lights seen for the first time start off, remembering `default_color`.
    #[must_use]
    pub fn new(default_color: Kelvin) -> Self {
        Self {
            default_color,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `count` calls fail.
    pub fn fail_next(&self, count: usize) {
        self.lock().failures = count;
    }

    /// Every call received so far, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<RecordedCall> {
        self.lock().history.clone()
    }

    /// Simulated state of `selector`, if it was ever addressed.
    #[must_use]
    pub fn light(&self, selector: &Selector) -> Option<VirtualLight> {
        self.lock().lights.get(selector).cloned()
    }

    fn record(&self, call: RecordedCall) -> Result<(), TwilightError> {
        let mut state = self.lock();
        state.history.push(call.clone());
        if state.failures > 0 {
            state.failures -= 1;
            return Err(TwilightError::Client(Box::new(VirtualFailure)));
        }

        let default_color = self.default_color;
        let lights = &mut state.lights;
        match call {
            RecordedCall::State(command) => {
                light_mut(lights, &command.selector, default_color).apply(&command);
            }
            RecordedCall::Cycle { selector, states } => {
                // The remote device plays the cycle on its own; only the
                // final state matters here.
                if let Some(last) = states.last() {
                    light_mut(lights, &selector, default_color).apply(last);
                }
            }
            RecordedCall::Toggle(selector) => {
                light_mut(lights, &selector, default_color).toggle();
            }
            RecordedCall::List(_) => {}
        }
        Ok(())
    }
}

fn light_mut<'a>(
    lights: &'a mut HashMap<Selector, VirtualLight>,
    selector: &Selector,
    default_color: Kelvin,
) -> &'a mut VirtualLight {
    lights
        .entry(selector.clone())
        .or_insert_with(|| VirtualLight::new(selector.clone(), default_color))
}

impl LightingClient for VirtualLightingClient {
    fn put_state(
        &self,
        _token: &str,
        command: &LightCommand,
    ) -> impl Future<Output = Result<(), TwilightError>> + Send {
        tracing::debug!(selector = %command.selector, power = %command.power, color = %command.color, "virtual state");
        let result = self.record(RecordedCall::State(command.clone()));
        async { result }
    }

    fn post_cycle(
        &self,
        _token: &str,
        selector: &Selector,
        states: &[LightCommand],
    ) -> impl Future<Output = Result<(), TwilightError>> + Send {
        tracing::debug!(%selector, states = states.len(), "virtual cycle");
        let result = self.record(RecordedCall::Cycle {
            selector: selector.clone(),
            states: states.to_vec(),
        });
        async { result }
    }

    fn toggle(
        &self,
        _token: &str,
        selector: &Selector,
    ) -> impl Future<Output = Result<(), TwilightError>> + Send {
        let result = self.record(RecordedCall::Toggle(selector.clone()));
        async { result }
    }

    fn list_lights(
        &self,
        _token: &str,
        selector: &Selector,
    ) -> impl Future<Output = Result<serde_json::Value, TwilightError>> + Send {
        let result = self.record(RecordedCall::List(selector.clone())).and_then(|()| {
            let state = self.lock();
            let lights: Vec<&VirtualLight> = state
                .lights
                .values()
                .filter(|light| selector.as_str() == "all" || &light.id == selector)
                .collect();
            serde_json::to_value(lights).map_err(|err| TwilightError::Client(Box::new(err)))
        });
        async { result }
    }
}
