//! Active transition runs.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use twilight_app::ports::{ConfigStore, FiringLedger, LightingClient, SunEventProvider};
use twilight_app::run_table::RunInfo;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the cancel endpoint.
pub enum CancelResponse {
    /// The run was told to stop; it winds down in the background.
    Accepted(Json<RunInfo>),
}

impl IntoResponse for CancelResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => (StatusCode::ACCEPTED, json).into_response(),
        }
    }
}

/// `GET /api/runs`
pub async fn list<C, S, L, CS>(State(state): State<AppState<C, S, L, CS>>) -> Json<Vec<RunInfo>>
where
    C: LightingClient + 'static,
    S: SunEventProvider + 'static,
    L: FiringLedger + 'static,
    CS: ConfigStore + 'static,
{
    Json(state.actions.dusk().runs().list())
}

/// `DELETE /api/runs/{name}`
pub async fn cancel<C, S, L, CS>(
    State(state): State<AppState<C, S, L, CS>>,
    Path(name): Path<String>,
) -> Result<CancelResponse, ApiError>
where
    C: LightingClient + 'static,
    S: SunEventProvider + 'static,
    L: FiringLedger + 'static,
    CS: ConfigStore + 'static,
{
    let config = state.config.snapshot();
    let run = state.actions.dusk().cancel(&config, &name)?;
    Ok(CancelResponse::Accepted(Json(run)))
}
