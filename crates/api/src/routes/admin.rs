use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /switches   -> get_switches
/// PUT    /switches   -> set_switch
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/switches",
        get(admin::get_switches).put(admin::set_switch),
    )
}
