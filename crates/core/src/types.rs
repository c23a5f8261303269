/// Missions are keyed by random (v4) UUIDs so ids cannot be guessed.
pub type MissionId = uuid::Uuid;

/// Chat-platform account ids (users and groups) are 64-bit integers.
pub type AccountId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
