//! Shared helpers for API integration tests: an in-memory application and
//! request/response utilities.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;
use wtstat_core::profile::Profile;
use wtstat_crawler::{CrawlerConfig, ScrapeRequest, ScrapeTransport, TransportError};
use wtstat_db::MemoryStore;
use wtstat_engine::{build_orchestrator, EngineConfig, LogDispatcher, Stores};

use wtstat_api::config::ServerConfig;
use wtstat_api::router::build_app_router;
use wtstat_api::state::AppState;

pub const NOT_FOUND_PAGE: &str =
    r#"<html><body><div class="user__unavailable-title">User not found</div></body></html>"#;

/// Answers every primary request with the not-found page and every
/// secondary request with an empty export.
pub struct NotFoundTransport;

#[async_trait]
impl ScrapeTransport for NotFoundTransport {
    async fn fetch(&self, request: &ScrapeRequest) -> Result<String, TransportError> {
        if request.url.path().ends_with("/export/json") {
            return Ok(r#"{"stats":{}}"#.to_string());
        }
        Ok(NOT_FOUND_PAGE.to_string())
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        database_url: None,
    }
}

/// Build the full application router over a fresh in-memory store.
///
/// Uses the same [`build_app_router`] as `main.rs`, so the middleware stack
/// under test is the production one.
pub fn build_test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = build_orchestrator(
        Stores::shared(Arc::clone(&store)),
        Arc::new(NotFoundTransport),
        Arc::new(LogDispatcher),
        &CrawlerConfig::default(),
        &EngineConfig::default(),
    )
    .expect("default selectors compile");

    let config = test_config();
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        pool: None,
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), store)
}

/// A profile row last updated `age` ago.
pub fn stored_profile(nickname: &str, age: chrono::Duration) -> Profile {
    let at = Utc::now() - age;
    Profile {
        nickname: nickname.to_string(),
        clan: "TEST".to_string(),
        clan_url: String::new(),
        banned: false,
        register_date: None,
        title: "Ace".to_string(),
        level: 100,
        ts_ab_rate: 1.5,
        ts_rb_rate: 2.25,
        ts_sb_rate: 0.75,
        created_at: at,
        updated_at: at,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");

    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Poll `GET /api/v1/missions/{id}` until the mission leaves `pending`.
pub async fn wait_for_terminal(app: &Router, mission_id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let response = get(app.clone(), &format!("/api/v1/missions/{mission_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        if json["data"]["status"] != "pending" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("mission {mission_id} never finished");
}
