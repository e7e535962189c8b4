//! Request handlers.

#[allow(clippy::missing_errors_doc)]
pub mod bulb;
#[allow(clippy::missing_errors_doc)]
pub mod config;
#[allow(clippy::missing_errors_doc)]
pub mod runs;

use axum::Router;
use axum::routing::{delete, get, post};

use twilight_app::ports::{ConfigStore, FiringLedger, LightingClient, SunEventProvider};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<C, S, L, CS>() -> Router<AppState<C, S, L, CS>>
where
    C: LightingClient + 'static,
    S: SunEventProvider + 'static,
    L: FiringLedger + 'static,
    CS: ConfigStore + 'static,
{
    Router::new()
        .route("/runs", get(runs::list::<C, S, L, CS>))
        .route("/runs/{name}", delete(runs::cancel::<C, S, L, CS>))
        .route("/config/reload", post(config::reload::<C, S, L, CS>))
}
