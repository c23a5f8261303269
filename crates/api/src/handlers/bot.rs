//! Handlers for already-parsed chat commands.
//!
//! Every command answers 200 with the immediate reply text. Rejections and
//! engine failures become reply text too; the gateway only relays it. When
//! `stop_all_responses` is set, commands schedule nothing and `reply` is
//! `null`.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use wtstat_core::messages;
use wtstat_core::mission::ReplyRoute;
use wtstat_core::profile::MessageStyle;
use wtstat_core::quota::QuotaSubject;
use wtstat_core::types::{AccountId, MissionId};
use wtstat_engine::{EngineError, QueryOutcome, QueryRequest, ReplyRequest};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCommand {
    pub user_id: AccountId,
    /// Absent for private chats, which get no deferred reply.
    #[serde(default)]
    pub group_id: Option<AccountId>,
    pub nickname: String,
    /// Long-form profile message.
    #[serde(default)]
    pub full: bool,
}

impl QueryCommand {
    fn into_request(self) -> QueryRequest {
        let style = if self.full {
            MessageStyle::Full
        } else {
            MessageStyle::Short
        };
        QueryRequest {
            nickname: self.nickname,
            subject: Some(QuotaSubject {
                user_id: self.user_id,
                group_id: self.group_id,
            }),
            reply: self.group_id.map(|group_id| ReplyRequest {
                route: ReplyRoute {
                    group_id,
                    user_id: Some(self.user_id),
                },
                style,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindCommand {
    pub user_id: AccountId,
    pub nickname: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReply {
    pub reply: Option<String>,
    pub mission_id: Option<MissionId>,
}

impl CommandReply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            mission_id: None,
        }
    }

    fn silent() -> Self {
        Self::default()
    }
}

/// Reply text for an engine failure. Internal detail stays in the logs.
fn failure_reply(err: EngineError) -> CommandReply {
    match err.rejection() {
        Some(rejection) => CommandReply::text(rejection.message()),
        None => {
            tracing::error!(error = %err, "Bot command failed");
            CommandReply::text(messages::CANNOT_QUERY)
        }
    }
}

async fn responses_enabled(state: &AppState) -> bool {
    match state.orchestrator.responses_enabled().await {
        Ok(enabled) => enabled,
        Err(e) => {
            tracing::error!(error = %e, "Could not read response switch");
            false
        }
    }
}

fn reply(body: CommandReply) -> Json<DataResponse<CommandReply>> {
    Json(DataResponse { data: body })
}

// ---------------------------------------------------------------------------
// Query commands
// ---------------------------------------------------------------------------

/// POST /api/v1/bot/query
pub async fn query_command(
    State(state): State<AppState>,
    Json(input): Json<QueryCommand>,
) -> AppResult<impl IntoResponse> {
    if !responses_enabled(&state).await {
        return Ok(reply(CommandReply::silent()));
    }

    let style = if input.full {
        MessageStyle::Full
    } else {
        MessageStyle::Short
    };
    let body = match state.orchestrator.query(input.into_request()).await {
        Ok(QueryOutcome::Cached(profile)) => CommandReply::text(profile.to_message(style)),
        Ok(QueryOutcome::Submitted(mission_id)) => CommandReply {
            reply: Some(messages::QUERY_RUNNING.to_string()),
            mission_id: Some(mission_id),
        },
        Err(e) => failure_reply(e),
    };
    Ok(reply(body))
}

/// POST /api/v1/bot/refresh
pub async fn refresh_command(
    State(state): State<AppState>,
    Json(input): Json<QueryCommand>,
) -> AppResult<impl IntoResponse> {
    if !responses_enabled(&state).await {
        return Ok(reply(CommandReply::silent()));
    }

    let body = match state.orchestrator.refresh(input.into_request()).await {
        Ok(mission_id) => CommandReply {
            reply: Some(messages::QUERY_RUNNING.to_string()),
            mission_id: Some(mission_id),
        },
        Err(e) => failure_reply(e),
    };
    Ok(reply(body))
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// POST /api/v1/bot/bindings
pub async fn bind_command(
    State(state): State<AppState>,
    Json(input): Json<BindCommand>,
) -> AppResult<impl IntoResponse> {
    if !responses_enabled(&state).await {
        return Ok(reply(CommandReply::silent()));
    }

    let body = match state.orchestrator.bind(input.user_id, &input.nickname).await {
        Ok(outcome) => CommandReply::text(outcome.message()),
        Err(e) => failure_reply(e),
    };
    Ok(reply(body))
}

/// DELETE /api/v1/bot/bindings/{user_id}
pub async fn unbind_command(
    State(state): State<AppState>,
    Path(user_id): Path<AccountId>,
) -> AppResult<impl IntoResponse> {
    if !responses_enabled(&state).await {
        return Ok(reply(CommandReply::silent()));
    }

    let body = match state.orchestrator.unbind(user_id).await {
        Ok(()) => CommandReply::text(messages::UNBINDING_SUCCESS),
        Err(e) => failure_reply(e),
    };
    Ok(reply(body))
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

/// GET /api/v1/bot/groups/{id}/usage
pub async fn group_usage(
    State(state): State<AppState>,
    Path(group_id): Path<AccountId>,
) -> AppResult<impl IntoResponse> {
    let usage = state.orchestrator.group_usage(group_id).await?;
    Ok(Json(DataResponse { data: usage }))
}
