//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use twilight_app::ports::{ConfigStore, FiringLedger, LightingClient, SunEventProvider};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Serves the bulb surface at `/bulb`, the JSON API under `/api` and a
/// health probe. Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level.
pub fn build<C, S, L, CS>(state: AppState<C, S, L, CS>) -> Router
where
    C: LightingClient + 'static,
    S: SunEventProvider + 'static,
    L: FiringLedger + 'static,
    CS: ConfigStore + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/bulb/{name}/{action}",
            get(crate::api::bulb::perform::<C, S, L, CS>),
        )
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
