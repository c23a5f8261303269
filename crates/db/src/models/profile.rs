//! Row model for the `game_profiles` table.

use chrono::NaiveDate;
use sqlx::FromRow;
use wtstat_core::profile::Profile;
use wtstat_core::types::Timestamp;

/// A row from the `game_profiles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub nickname: String,
    pub clan: String,
    pub clan_url: String,
    pub banned: bool,
    pub register_date: Option<NaiveDate>,
    pub title: String,
    pub level: i32,
    pub ts_ab_rate: f64,
    pub ts_rb_rate: f64,
    pub ts_sb_rate: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            nickname: row.nickname,
            clan: row.clan,
            clan_url: row.clan_url,
            banned: row.banned,
            register_date: row.register_date,
            title: row.title,
            level: row.level,
            ts_ab_rate: row.ts_ab_rate,
            ts_rb_rate: row.ts_rb_rate,
            ts_sb_rate: row.ts_sb_rate,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
