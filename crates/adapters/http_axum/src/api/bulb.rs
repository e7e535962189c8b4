//! The bulb control surface.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use twilight_app::ports::{ConfigStore, FiringLedger, LightingClient, SunEventProvider};
use twilight_app::services::ActionOutcome;
use twilight_domain::action::Action;
use twilight_domain::time;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the bulb endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct BulbQuery {
    /// Skip the sunset window and the daily marker.
    #[serde(default)]
    pub force: bool,
}

/// `GET /bulb/{name}/{action}`
pub async fn perform<C, S, L, CS>(
    State(state): State<AppState<C, S, L, CS>>,
    Path((name, action)): Path<(String, String)>,
    Query(query): Query<BulbQuery>,
) -> Result<Json<ActionOutcome>, ApiError>
where
    C: LightingClient + 'static,
    S: SunEventProvider + 'static,
    L: FiringLedger + 'static,
    CS: ConfigStore + 'static,
{
    let action = Action::from_str(&action)?;
    let config = state.config.snapshot();
    let outcome = state
        .actions
        .perform(&config, &name, action, query.force, time::now())
        .await?;
    Ok(Json(outcome))
}
