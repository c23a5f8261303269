//! Repository for the `query_counters` table.

use sqlx::PgPool;

pub struct CounterRepo;

impl CounterRepo {
    /// Atomically add `n` to a counter, creating it at `n` if absent.
    ///
    /// Single-statement upsert, so concurrent increments never lose updates.
    pub async fn increment(pool: &PgPool, key: &str, n: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO query_counters (counter_key, value) VALUES ($1, $2) \
             ON CONFLICT (counter_key) DO UPDATE \
             SET value = query_counters.value + EXCLUDED.value, updated_at = NOW() \
             RETURNING value",
        )
        .bind(key)
        .bind(n)
        .fetch_one(pool)
        .await
    }

    /// Add one unless the counter is already at `limit`. `None` means no
    /// row was written.
    ///
    /// The conflict branch only updates while `value < limit`, so the check
    /// and the increment happen in one statement.
    pub async fn increment_below(
        pool: &PgPool,
        key: &str,
        limit: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        if limit <= 0 {
            return Ok(None);
        }
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO query_counters (counter_key, value) VALUES ($1, 1) \
             ON CONFLICT (counter_key) DO UPDATE \
             SET value = query_counters.value + 1, updated_at = NOW() \
             WHERE query_counters.value < $2 \
             RETURNING value",
        )
        .bind(key)
        .bind(limit)
        .fetch_optional(pool)
        .await
    }

    pub async fn get(pool: &PgPool, key: &str) -> Result<i64, sqlx::Error> {
        let value = sqlx::query_scalar::<_, i64>(
            "SELECT value FROM query_counters WHERE counter_key = $1",
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;
        Ok(value.unwrap_or(0))
    }
}
