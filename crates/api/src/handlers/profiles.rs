//! Anonymous profile lookups for the web surface. These calls skip the
//! per-user counters and never register a reply route.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use wtstat_core::profile::Profile;
use wtstat_core::types::MissionId;
use wtstat_engine::{QueryOutcome, QueryRequest};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NicknameParams {
    pub nickname: String,
}

/// Either the stored profile or the id of the mission fetching it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub profile: Option<Profile>,
    pub mission_id: Option<MissionId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionCreated {
    pub mission_id: MissionId,
}

/// GET /api/v1/profiles/query?nickname=
///
/// 200 with the profile when it is stored, 202 with a mission id otherwise.
pub async fn query_profile(
    State(state): State<AppState>,
    Query(params): Query<NicknameParams>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .orchestrator
        .query(QueryRequest::anonymous(params.nickname))
        .await?;

    let (status, body) = match outcome {
        QueryOutcome::Cached(profile) => (
            StatusCode::OK,
            QueryResponse {
                profile: Some(profile),
                mission_id: None,
            },
        ),
        QueryOutcome::Submitted(mission_id) => (
            StatusCode::ACCEPTED,
            QueryResponse {
                profile: None,
                mission_id: Some(mission_id),
            },
        ),
    };
    Ok((status, Json(DataResponse { data: body })))
}

/// POST /api/v1/profiles/refresh?nickname=
pub async fn refresh_profile(
    State(state): State<AppState>,
    Query(params): Query<NicknameParams>,
) -> AppResult<impl IntoResponse> {
    let mission_id = state.orchestrator.submit_refresh(&params.nickname).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: MissionCreated { mission_id },
        }),
    ))
}
