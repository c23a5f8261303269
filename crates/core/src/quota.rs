//! Admission-control vocabulary: counter keys, limits, switches, rejections.
//!
//! The evaluation order lives in the engine's gate; this module only holds
//! the pure pieces so they can be shared with storage backends.

use serde::{Deserialize, Serialize};

use crate::messages;
use crate::types::{AccountId, Timestamp};

/// One durable counter. Day rollover (resetting the `*Today` keys) happens
/// outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKey {
    UserToday(AccountId),
    UserTotal(AccountId),
    GroupToday(AccountId),
    GroupTotal(AccountId),
}

impl CounterKey {
    pub fn as_key(&self) -> String {
        match self {
            Self::UserToday(id) => format!("user:{id}:today"),
            Self::UserTotal(id) => format!("user:{id}:total"),
            Self::GroupToday(id) => format!("group:{id}:today"),
            Self::GroupTotal(id) => format!("group:{id}:total"),
        }
    }
}

/// Who is charged for an admitted query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSubject {
    pub user_id: AccountId,
    pub group_id: Option<AccountId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub user_daily: i64,
    pub group_daily: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub today: i64,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Global switches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalSwitch {
    StopAllResponses,
    StopAllQueries,
}

impl GlobalSwitch {
    /// Key in the shared `global_configs` store.
    pub fn key(self) -> &'static str {
        match self {
            Self::StopAllResponses => "stop_all_responses",
            Self::StopAllQueries => "stop_all_queries",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalSwitches {
    pub stop_all_responses: bool,
    pub stop_all_queries: bool,
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a query or refresh was refused before any mission was created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("queries are globally disabled")]
    QueriesDisabled,

    #[error("invalid nickname")]
    InvalidNickname,

    #[error("self alias used without a bound nickname")]
    NoBoundNickname,

    #[error("profile was refreshed too recently")]
    TooSoonToRefresh,

    #[error("group daily limit reached ({usage}/{limit})")]
    GroupLimit { usage: i64, limit: i64 },

    #[error("user daily limit reached ({usage}/{limit})")]
    UserLimit { usage: i64, limit: i64 },
}

impl Rejection {
    /// Text shown to the caller.
    pub fn message(&self) -> String {
        match self {
            Self::QueriesDisabled => messages::QUERIES_DISABLED.to_string(),
            Self::InvalidNickname => messages::INVALID_NICKNAME.to_string(),
            Self::NoBoundNickname => messages::NO_BOUND_NICKNAME.to_string(),
            Self::TooSoonToRefresh => messages::TOO_SOON_TO_REFRESH.to_string(),
            Self::GroupLimit { usage, limit } => messages::group_limit_reached(*usage, *limit),
            Self::UserLimit { usage, limit } => messages::user_limit_reached(*usage, *limit),
        }
    }
}

/// A profile last updated less than `cooldown` ago cannot be force-refreshed.
pub fn refresh_allowed(updated_at: Timestamp, now: Timestamp, cooldown: chrono::Duration) -> bool {
    now - updated_at >= cooldown
}
