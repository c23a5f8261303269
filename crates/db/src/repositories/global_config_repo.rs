//! Repository for the `global_configs` key/value table.

use sqlx::PgPool;

pub struct GlobalConfigRepo;

impl GlobalConfigRepo {
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT config_value FROM global_configs WHERE config_key = $1",
        )
        .bind(key)
        .fetch_optional(pool)
        .await
    }

    /// Create or overwrite a config value.
    pub async fn upsert(pool: &PgPool, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO global_configs (config_key, config_value) VALUES ($1, $2) \
             ON CONFLICT (config_key) DO UPDATE \
             SET config_value = EXCLUDED.config_value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(())
    }
}
