use axum::routing::{get, post};
use axum::Router;

use crate::handlers::profiles;
use crate::state::AppState;

/// Routes mounted at `/profiles`.
///
/// ```text
/// GET    /query?nickname=     -> query_profile
/// POST   /refresh?nickname=   -> refresh_profile
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/query", get(profiles::query_profile))
        .route("/refresh", post(profiles::refresh_profile))
}
