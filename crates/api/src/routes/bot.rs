//! Chat command surface. Command text parsing happens in the gateway; these
//! routes receive already-parsed commands.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::bot;
use crate::state::AppState;

/// Routes mounted at `/bot`.
///
/// ```text
/// POST   /query                 -> query_command
/// POST   /refresh               -> refresh_command
/// POST   /bindings              -> bind_command
/// DELETE /bindings/{user_id}    -> unbind_command
/// GET    /groups/{id}/usage     -> group_usage
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/query", post(bot::query_command))
        .route("/refresh", post(bot::refresh_command))
        .route("/bindings", post(bot::bind_command))
        .route("/bindings/{user_id}", delete(bot::unbind_command))
        .route("/groups/{id}/usage", get(bot::group_usage))
}
