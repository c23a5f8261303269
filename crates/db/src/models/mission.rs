//! Row model for the `missions` table.

use sqlx::FromRow;
use wtstat_core::error::StoreError;
use wtstat_core::mission::{Mission, MissionDetail, MissionResult, MissionStatus, MissionType};
use wtstat_core::types::{MissionId, Timestamp};

/// A row from the `missions` table.
#[derive(Debug, Clone, FromRow)]
pub struct MissionRow {
    pub id: MissionId,
    pub mission_type: String,
    pub status_id: i16,
    pub detail: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MissionRow {
    /// Decode payload columns. Unknown payload kinds decode to their
    /// `Unknown` variants; an unknown type or status is a hard error.
    pub fn into_domain(self) -> Result<Mission, StoreError> {
        let mission_type = MissionType::parse(&self.mission_type).ok_or_else(|| {
            StoreError::Backend(format!(
                "mission {} has unknown type {:?}",
                self.id, self.mission_type
            ))
        })?;
        let status = MissionStatus::from_id(self.status_id).ok_or_else(|| {
            StoreError::Backend(format!(
                "mission {} has unknown status_id {}",
                self.id, self.status_id
            ))
        })?;
        Ok(Mission {
            id: self.id,
            mission_type,
            status,
            detail: MissionDetail::decode(&self.detail),
            result: self.result.as_ref().map(MissionResult::decode),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
