//! Durable storage for wtstat.
//!
//! - [`PgStore`] implements every `wtstat_core::store` trait on PostgreSQL
//!   through the zero-sized repositories in [`repositories`].
//! - [`MemoryStore`] implements the same traits in process memory, for
//!   single-instance development runs and tests.

use sqlx::postgres::PgPoolOptions;
use wtstat_core::error::StoreError;

pub mod memory;
pub mod models;
pub mod pg_store;
pub mod repositories;

pub use memory::MemoryStore;
pub use pg_store::PgStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the pool is usable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Translate a sqlx error into the backend-neutral [`StoreError`].
///
/// PostgreSQL unique violations (`23505`) become
/// [`StoreError::AlreadyExists`] carrying the constraint name.
pub fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unique");
            return StoreError::AlreadyExists(constraint.to_string());
        }
    }
    tracing::error!(error = %err, "Database error");
    StoreError::backend(err)
}
