//! Shared application state for axum handlers.

use std::sync::Arc;

use twilight_app::ports::{ConfigStore, FiringLedger, LightingClient, SunEventProvider};
use twilight_app::services::{ActionService, ConfigService};

/// Application state shared across all axum handlers.
///
/// Generic over the lighting client, sun provider, firing ledger and config
/// store to avoid dynamic dispatch. `Clone` is implemented manually so the
/// underlying types themselves do not need to be `Clone`.
pub struct AppState<C, S, L, CS> {
    /// Direct and dusk actions.
    pub actions: ActionService<C, S, L>,
    /// Current lighting snapshot and reloads.
    pub config: Arc<ConfigService<CS>>,
}

impl<C, S, L, CS> Clone for AppState<C, S, L, CS> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C, S, L, CS> AppState<C, S, L, CS>
where
    C: LightingClient + 'static,
    S: SunEventProvider + 'static,
    L: FiringLedger + 'static,
    CS: ConfigStore + 'static,
{
    /// The config service is shared with the reload signal handler, so it
    /// comes in already wrapped.
    #[must_use]
    pub fn new(actions: ActionService<C, S, L>, config: Arc<ConfigService<CS>>) -> Self {
        Self { actions, config }
    }
}
