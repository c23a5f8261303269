use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wtstat_crawler::{CrawlerConfig, HttpTransport, ScrapeTransport};
use wtstat_db::{MemoryStore, PgStore};
use wtstat_engine::{Dispatcher, EngineConfig, HttpDispatcher, LogDispatcher, Stores};

use wtstat_api::config::ServerConfig;
use wtstat_api::router::build_app_router;
use wtstat_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wtstat_api=debug,wtstat_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let engine_config = EngineConfig::from_env();
    let crawler_config = CrawlerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Storage ---
    let (stores, pool) = match &config.database_url {
        Some(database_url) => {
            let pool = wtstat_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            wtstat_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            wtstat_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            (Stores::shared(Arc::new(PgStore::new(pool.clone()))), Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store (single instance only)");
            (Stores::shared(Arc::new(MemoryStore::new())), None)
        }
    };

    // --- Crawler and dispatcher ---
    let transport: Arc<dyn ScrapeTransport> = Arc::new(
        HttpTransport::new(&crawler_config).expect("Failed to build scrape transport"),
    );

    let dispatcher: Arc<dyn Dispatcher> = match &engine_config.bot_gateway_url {
        Some(url) => {
            tracing::info!(gateway = %url, "Replies go to the bot gateway");
            Arc::new(HttpDispatcher::new(url).expect("Failed to build gateway client"))
        }
        None => {
            tracing::warn!("BOT_GATEWAY_URL not set, replies are only logged");
            Arc::new(LogDispatcher)
        }
    };

    let orchestrator = wtstat_engine::build_orchestrator(
        stores,
        transport,
        dispatcher,
        &crawler_config,
        &engine_config,
    )
    .expect("Invalid primary source selectors");

    // --- App state ---
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        pool,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // In-flight crawl and waiter tasks are dropped with the runtime; their
    // missions stay pending in the store.
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
