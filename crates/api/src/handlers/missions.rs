use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wtstat_core::types::MissionId;

use crate::error::{AppError, AppResult};
use crate::handlers::profiles::NicknameParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CountParams {
    /// RFC 3339 timestamp.
    pub after: String,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// GET /api/v1/missions?nickname=
///
/// Every mission submitted for the nickname, newest first.
pub async fn list_missions(
    State(state): State<AppState>,
    Query(params): Query<NicknameParams>,
) -> AppResult<impl IntoResponse> {
    let nickname = params.nickname.trim();
    if nickname.is_empty() {
        return Err(AppError::BadRequest("nickname must not be empty".to_string()));
    }
    let missions = state.orchestrator.list_missions_for_nickname(nickname).await?;
    Ok(Json(DataResponse { data: missions }))
}

/// GET /api/v1/missions/{id}
pub async fn get_mission(
    State(state): State<AppState>,
    Path(id): Path<MissionId>,
) -> AppResult<impl IntoResponse> {
    let mission = state.orchestrator.get_mission_result(id).await?;
    Ok(Json(DataResponse { data: mission }))
}

/// GET /api/v1/missions/count?after=
///
/// Number of missions created strictly after `after`.
pub async fn count_missions(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> AppResult<impl IntoResponse> {
    let after = DateTime::parse_from_rfc3339(&params.after)
        .map_err(|e| AppError::BadRequest(format!("Invalid timestamp '{}': {e}", params.after)))?
        .with_timezone(&Utc);

    let count = state.orchestrator.count_missions_created_after(after).await?;
    Ok(Json(DataResponse {
        data: CountResponse { count },
    }))
}
