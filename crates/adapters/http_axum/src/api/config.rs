//! Lighting configuration reload.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use twilight_app::ports::{ConfigStore, FiringLedger, LightingClient, SunEventProvider};
use twilight_app::run_table::RunInfo;

use crate::error::ApiError;
use crate::state::AppState;

/// Summary returned after a successful reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub devices: usize,
    pub profile_changed: bool,
    /// Runs stopped because their device or profile changed.
    pub cancelled: Vec<RunInfo>,
}

/// `POST /api/config/reload`
pub async fn reload<C, S, L, CS>(
    State(state): State<AppState<C, S, L, CS>>,
) -> Result<Json<ReloadResponse>, ApiError>
where
    C: LightingClient + 'static,
    S: SunEventProvider + 'static,
    L: FiringLedger + 'static,
    CS: ConfigStore + 'static,
{
    let report = state.config.reload().await?;
    let cancelled = state.actions.dusk().apply_reload(&report);
    Ok(Json(ReloadResponse {
        devices: report.devices,
        profile_changed: report.profile_changed,
        cancelled,
    }))
}
