use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use wtstat_core::quota::GlobalSwitch;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetSwitchRequest {
    pub switch: GlobalSwitch,
    pub value: bool,
}

/// GET /api/v1/admin/switches
pub async fn get_switches(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let switches = state.orchestrator.get_switches().await?;
    Ok(Json(DataResponse { data: switches }))
}

/// PUT /api/v1/admin/switches
///
/// Set one switch and return the full set.
pub async fn set_switch(
    State(state): State<AppState>,
    Json(input): Json<SetSwitchRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .orchestrator
        .set_switch(input.switch, input.value)
        .await?;

    let switches = state.orchestrator.get_switches().await?;
    Ok(Json(DataResponse { data: switches }))
}
