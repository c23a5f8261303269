//! Repository for the `game_profiles` table.

use sqlx::PgPool;
use wtstat_core::profile::{NewProfile, ProfileUpdate};

use crate::models::profile::ProfileRow;

/// Column list for `game_profiles` queries.
const COLUMNS: &str = "\
    id, nickname, clan, clan_url, banned, register_date, title, level, \
    ts_ab_rate, ts_rb_rate, ts_sb_rate, created_at, updated_at";

pub struct ProfileRepo;

impl ProfileRepo {
    pub async fn find_by_nickname(
        pool: &PgPool,
        nickname: &str,
    ) -> Result<Option<ProfileRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM game_profiles WHERE nickname = $1");
        sqlx::query_as::<_, ProfileRow>(&query)
            .bind(nickname)
            .fetch_optional(pool)
            .await
    }

    /// Insert a profile. A second insert for the same nickname violates
    /// `uq_game_profiles_nickname`.
    pub async fn create(pool: &PgPool, input: &NewProfile) -> Result<ProfileRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO game_profiles \
                 (nickname, clan, clan_url, banned, register_date, title, level) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProfileRow>(&query)
            .bind(&input.nickname)
            .bind(&input.clan)
            .bind(&input.clan_url)
            .bind(input.banned)
            .bind(input.register_date)
            .bind(&input.title)
            .bind(input.level)
            .fetch_one(pool)
            .await
    }

    /// Patch the profile for `nickname`. `None` fields keep their value.
    pub async fn update(
        pool: &PgPool,
        nickname: &str,
        input: &ProfileUpdate,
    ) -> Result<Option<ProfileRow>, sqlx::Error> {
        let query = format!(
            "UPDATE game_profiles SET \
                 clan = COALESCE($2, clan), \
                 clan_url = COALESCE($3, clan_url), \
                 banned = COALESCE($4, banned), \
                 register_date = COALESCE($5, register_date), \
                 title = COALESCE($6, title), \
                 level = COALESCE($7, level), \
                 ts_ab_rate = COALESCE($8, ts_ab_rate), \
                 ts_rb_rate = COALESCE($9, ts_rb_rate), \
                 ts_sb_rate = COALESCE($10, ts_sb_rate), \
                 updated_at = NOW() \
             WHERE nickname = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProfileRow>(&query)
            .bind(nickname)
            .bind(&input.clan)
            .bind(&input.clan_url)
            .bind(input.banned)
            .bind(input.register_date)
            .bind(&input.title)
            .bind(input.level)
            .bind(input.ts_ab_rate)
            .bind(input.ts_rb_rate)
            .bind(input.ts_sb_rate)
            .fetch_optional(pool)
            .await
    }
}
