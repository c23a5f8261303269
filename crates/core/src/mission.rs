//! Mission lifecycle model.
//!
//! A mission is the durable record of one asynchronous crawl attempt. It is
//! created `Pending`, moved exactly once to `Success` or `Failed`, and never
//! touched again. Submitter, crawler and waiter may live in different
//! processes, so this record is the only state they share.

use serde::{Deserialize, Serialize};

use crate::profile::{ModeTables, PageStats, Profile, RateTables};
use crate::types::{AccountId, MissionId, Timestamp};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Mission status. Discriminants match the `status_id` column.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Pending = 1,
    Success = 2,
    Failed = 3,
}

impl MissionStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Success),
            3 => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl From<MissionStatus> for StatusId {
    fn from(value: MissionStatus) -> Self {
        value as StatusId
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid mission transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

pub mod state_machine {
    use super::{MissionStatus, TransitionError};

    /// Statuses reachable from `from`. Terminal statuses have none.
    pub fn valid_transitions(from: MissionStatus) -> &'static [MissionStatus] {
        match from {
            MissionStatus::Pending => &[MissionStatus::Success, MissionStatus::Failed],
            MissionStatus::Success | MissionStatus::Failed => &[],
        }
    }

    pub fn can_transition(from: MissionStatus, to: MissionStatus) -> bool {
        valid_transitions(from).contains(&to)
    }

    pub fn validate_transition(
        from: MissionStatus,
        to: MissionStatus,
    ) -> Result<(), TransitionError> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(TransitionError {
                from: from.as_str(),
                to: to.as_str(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Type
// ---------------------------------------------------------------------------

/// Kind of work a mission represents. Stored as text so new kinds can be
/// added without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionType {
    /// Scrape a player profile from the primary and secondary sources.
    UserInfo,
}

impl MissionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserInfo => "user_info",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user_info" => Some(Self::UserInfo),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Detail payload
// ---------------------------------------------------------------------------

/// Where the completion message for a mission should be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRoute {
    pub group_id: AccountId,
    /// When set, the reply mentions this user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlDetail {
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRoute>,
}

/// Submission context, tagged per mission type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissionDetail {
    ProfileCrawl(CrawlDetail),
    /// A kind written by a newer release, or an undecodable row.
    #[serde(other)]
    Unknown,
}

/// Untagged shape written before payloads carried a `kind` tag.
#[derive(Debug, Deserialize)]
struct LegacyScheduleForm {
    nick: String,
    #[serde(default)]
    send_form: Option<LegacySendForm>,
}

#[derive(Debug, Deserialize)]
struct LegacySendForm {
    group_id: AccountId,
    #[serde(default)]
    user_id: Option<AccountId>,
}

impl MissionDetail {
    pub fn profile_crawl(nickname: impl Into<String>, reply: Option<ReplyRoute>) -> Self {
        Self::ProfileCrawl(CrawlDetail {
            nickname: nickname.into(),
            reply,
        })
    }

    pub fn nickname(&self) -> Option<&str> {
        match self {
            Self::ProfileCrawl(detail) => Some(&detail.nickname),
            Self::Unknown => None,
        }
    }

    pub fn reply(&self) -> Option<&ReplyRoute> {
        match self {
            Self::ProfileCrawl(detail) => detail.reply.as_ref(),
            Self::Unknown => None,
        }
    }

    /// Decode a stored payload, accepting both tagged and legacy rows.
    pub fn decode(value: &serde_json::Value) -> Self {
        if value.get("kind").is_some() {
            return serde_json::from_value(value.clone()).unwrap_or(Self::Unknown);
        }
        match serde_json::from_value::<LegacyScheduleForm>(value.clone()) {
            Ok(legacy) => Self::ProfileCrawl(CrawlDetail {
                nickname: legacy.nick,
                reply: legacy.send_form.map(|form| ReplyRoute {
                    group_id: form.group_id,
                    user_id: form.user_id,
                }),
            }),
            Err(_) => Self::Unknown,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Result payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub found: bool,
    pub nickname: String,
    /// HTTP status of the failed primary-source request, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    /// Page stat tables of a found profile.
    #[serde(default, skip_serializing_if = "PageStats::is_empty")]
    pub stats: PageStats,
    /// Short diagnostic for failed missions. Never shown to end users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlResult {
    pub fn not_found(nickname: impl Into<String>) -> Self {
        Self {
            found: false,
            nickname: nickname.into(),
            response_status: None,
            profile: None,
            stats: PageStats::default(),
            error: None,
        }
    }

    pub fn found(nickname: impl Into<String>, profile: Profile) -> Self {
        Self {
            found: true,
            nickname: nickname.into(),
            response_status: None,
            profile: Some(profile),
            stats: PageStats::default(),
            error: None,
        }
    }

    pub fn with_stats(mut self, stats: PageStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn failed(
        nickname: impl Into<String>,
        response_status: Option<u16>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            found: false,
            nickname: nickname.into(),
            response_status,
            profile: None,
            stats: PageStats::default(),
            error: Some(error.into()),
        }
    }
}

/// Outcome payload, tagged per mission type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissionResult {
    Crawl(CrawlResult),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct LegacyCrawlerResult {
    #[serde(default)]
    found: bool,
    #[serde(default)]
    nick: String,
    #[serde(default)]
    response_status: u16,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Page extract the earlier crawler stored next to the result flags.
#[derive(Debug, Default, Deserialize)]
struct LegacyPageData {
    #[serde(default)]
    user_stat: ModeTables,
    #[serde(default)]
    user_rate: RateTables,
}

impl MissionResult {
    pub fn decode(value: &serde_json::Value) -> Self {
        if value.get("kind").is_some() {
            return serde_json::from_value(value.clone()).unwrap_or(Self::Unknown);
        }
        match serde_json::from_value::<LegacyCrawlerResult>(value.clone()) {
            Ok(legacy) => Self::Crawl(CrawlResult {
                found: legacy.found,
                nickname: legacy.nick,
                response_status: (legacy.response_status != 0).then_some(legacy.response_status),
                profile: None,
                stats: legacy
                    .data
                    .and_then(|data| serde_json::from_value::<LegacyPageData>(data).ok())
                    .map(|data| PageStats {
                        user_stat: data.user_stat,
                        user_rate: data.user_rate,
                    })
                    .unwrap_or_default(),
                error: None,
            }),
            Err(_) => Self::Unknown,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn as_crawl(&self) -> Option<&CrawlResult> {
        match self {
            Self::Crawl(result) => Some(result),
            Self::Unknown => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Input for creating a pending mission.
#[derive(Debug, Clone)]
pub struct NewMission {
    pub id: MissionId,
    pub mission_type: MissionType,
    pub detail: MissionDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mission {
    pub id: MissionId,
    pub mission_type: MissionType,
    pub status: MissionStatus,
    pub detail: MissionDetail,
    pub result: Option<MissionResult>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Mission {
    /// A result is present iff the status is terminal.
    pub fn is_consistent(&self) -> bool {
        self.status.is_terminal() == self.result.is_some()
    }
}
