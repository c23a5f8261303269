//! Repository for the `missions` table.
//!
//! The terminal write is guarded on `status_id = pending`, so a duplicate
//! finalize affects zero rows instead of overwriting the first result.

use sqlx::PgPool;
use wtstat_core::mission::{MissionStatus, NewMission};
use wtstat_core::types::{MissionId, Timestamp};

use crate::models::mission::MissionRow;

/// Column list for `missions` queries.
const COLUMNS: &str = "id, mission_type, status_id, detail, result, created_at, updated_at";

pub struct MissionRepo;

impl MissionRepo {
    /// Insert a new pending mission.
    pub async fn create(pool: &PgPool, input: &NewMission) -> Result<MissionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO missions (id, mission_type, status_id, detail) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MissionRow>(&query)
            .bind(input.id)
            .bind(input.mission_type.as_str())
            .bind(MissionStatus::Pending.id())
            .bind(input.detail.to_value())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: MissionId,
    ) -> Result<Option<MissionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM missions WHERE id = $1");
        sqlx::query_as::<_, MissionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set a terminal status and result on a pending mission.
    ///
    /// Returns `true` if the row was updated, `false` if it was missing or
    /// already terminal.
    pub async fn set_terminal(
        pool: &PgPool,
        id: MissionId,
        status: MissionStatus,
        result: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE missions \
             SET status_id = $2, result = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(status.id())
        .bind(result)
        .bind(MissionStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    pub async fn count_created_after(pool: &PgPool, after: Timestamp) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM missions WHERE created_at > $1")
            .bind(after)
            .fetch_one(pool)
            .await
    }

    /// Missions for a nickname, matching both the tagged and the legacy
    /// detail layouts.
    pub async fn list_for_nickname(
        pool: &PgPool,
        nickname: &str,
    ) -> Result<Vec<MissionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM missions \
             WHERE detail->>'nickname' = $1 OR detail->>'nick' = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, MissionRow>(&query)
            .bind(nickname)
            .fetch_all(pool)
            .await
    }
}
