//! Repository for the `user_bindings` table.

use sqlx::PgPool;
use wtstat_core::types::AccountId;

pub struct BindingRepo;

impl BindingRepo {
    pub async fn find_nickname(
        pool: &PgPool,
        user_id: AccountId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT nickname FROM user_bindings WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a binding unless one exists. Returns `true` if inserted.
    pub async fn insert(
        pool: &PgPool,
        user_id: AccountId,
        nickname: &str,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "INSERT INTO user_bindings (user_id, nickname) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(nickname)
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, user_id: AccountId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_bindings WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
