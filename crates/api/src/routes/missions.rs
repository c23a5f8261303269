use axum::routing::get;
use axum::Router;

use crate::handlers::missions;
use crate::state::AppState;

/// Routes mounted at `/missions`.
///
/// ```text
/// GET    /?nickname=     -> list_missions
/// GET    /count?after=   -> count_missions
/// GET    /{id}           -> get_mission
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(missions::list_missions))
        .route("/count", get(missions::count_missions))
        .route("/{id}", get(missions::get_mission))
}
