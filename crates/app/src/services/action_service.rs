//! Action service: one entry point per action the router exposes.

use std::sync::Arc;

use serde::Serialize;

use twilight_domain::action::Action;
use twilight_domain::command::{LightCommand, Power};
use twilight_domain::config::LightingConfig;
use twilight_domain::device::DeviceTarget;
use twilight_domain::error::{NotFoundError, TwilightError};
use twilight_domain::time::Timestamp;

use crate::ports::{FiringLedger, LightingClient, SunEventProvider};
use crate::services::dusk_service::{DuskService, TriggerOutcome};

/// What an action produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Remote state, passed through unchanged.
    State { lights: serde_json::Value },
    /// A single command was accepted by the remote API.
    Applied,
    Dusk(TriggerOutcome),
}

/// Dispatches [`Action`]s for a named device.
pub struct ActionService<C, S, L> {
    client: Arc<C>,
    dusk: DuskService<C, S, L>,
}

impl<C, S, L> Clone for ActionService<C, S, L> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            dusk: self.dusk.clone(),
        }
    }
}

impl<C, S, L> ActionService<C, S, L>
where
    C: LightingClient + 'static,
    S: SunEventProvider,
    L: FiringLedger,
{
    #[must_use]
    pub fn new(client: Arc<C>, dusk: DuskService<C, S, L>) -> Self {
        Self { client, dusk }
    }

    #[must_use]
    pub fn dusk(&self) -> &DuskService<C, S, L> {
        &self.dusk
    }

    /// Run `action` against the device called `device_name`.
    ///
    /// `force` only matters for dusk actions.
    ///
    /// # Errors
    ///
    /// Returns [`TwilightError::NotFound`] for an unknown device, the client's
    /// error for direct actions, or whatever [`DuskService::trigger`] returns.
    #[tracing::instrument(skip(self, config))]
    pub async fn perform(
        &self,
        config: &LightingConfig,
        device_name: &str,
        action: Action,
        force: bool,
        now: Timestamp,
    ) -> Result<ActionOutcome, TwilightError> {
        match action {
            Action::Dusk(strategy) => self
                .dusk
                .trigger(config, device_name, strategy, force, now)
                .await
                .map(ActionOutcome::Dusk),
            Action::State => self.state(config, resolve(config, device_name)?).await,
            Action::Toggle => self.toggle(config, resolve(config, device_name)?).await,
            Action::On => {
                self.power(config, resolve(config, device_name)?, Power::On)
                    .await
            }
            Action::Off => {
                self.power(config, resolve(config, device_name)?, Power::Off)
                    .await
            }
        }
    }

    /// Current remote state of `device`.
    ///
    /// # Errors
    ///
    /// Returns the client's error.
    pub async fn state(
        &self,
        config: &LightingConfig,
        device: &DeviceTarget,
    ) -> Result<ActionOutcome, TwilightError> {
        let lights = self.client.list_lights(&config.token, &device.id).await?;
        Ok(ActionOutcome::State { lights })
    }

    /// Flip `device`'s power.
    ///
    /// # Errors
    ///
    /// Returns the client's error.
    pub async fn toggle(
        &self,
        config: &LightingConfig,
        device: &DeviceTarget,
    ) -> Result<ActionOutcome, TwilightError> {
        self.client.toggle(&config.token, &device.id).await?;
        tracing::info!(device = %device.name, "toggled");
        Ok(ActionOutcome::Applied)
    }

    /// Switch `device` on at full brightness or off, both in the default colour.
    ///
    /// # Errors
    ///
    /// Returns the client's error.
    pub async fn power(
        &self,
        config: &LightingConfig,
        device: &DeviceTarget,
        power: Power,
    ) -> Result<ActionOutcome, TwilightError> {
        let command = match power {
            Power::On => LightCommand::power_on(device.id.clone(), config.default_color, 1.0),
            Power::Off => LightCommand::power_off(device.id.clone(), config.default_color),
        };
        self.client.put_state(&config.token, &command).await?;
        tracing::info!(device = %device.name, %power, "power set");
        Ok(ActionOutcome::Applied)
    }
}

fn resolve<'a>(
    config: &'a LightingConfig,
    device_name: &str,
) -> Result<&'a DeviceTarget, NotFoundError> {
    config.find_device(device_name).ok_or_else(|| NotFoundError {
        entity: "Device",
        id: device_name.to_string(),
    })
}
