pub mod admin;
pub mod bot;
pub mod health;
pub mod missions;
pub mod profiles;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /profiles/query?nickname=          cached profile or new mission (GET)
/// /profiles/refresh?nickname=        force a crawl (POST)
///
/// /missions?nickname=               missions for a nickname, newest first
/// /missions/count?after=             missions created after a timestamp
/// /missions/{id}                     mission status and result
///
/// /bot/query                         chat query command (POST)
/// /bot/refresh                       chat refresh command (POST)
/// /bot/bindings                      bind a nickname (POST)
/// /bot/bindings/{user_id}            unbind (DELETE)
/// /bot/groups/{id}/usage             group counters
///
/// /admin/switches                    global switches (GET, PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/profiles", profiles::router())
        .nest("/missions", missions::router())
        .nest("/bot", bot::router())
        .nest("/admin", admin::router())
}
