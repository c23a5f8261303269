//! Mission lifecycle service: submit, finalize, find.
//!
//! Every instance talks to the same durable [`MissionStore`]; a mission
//! submitted through one service can be finalized and read through another.

use std::sync::Arc;

use wtstat_core::mission::{
    state_machine, Mission, MissionDetail, MissionResult, MissionStatus, MissionType, NewMission,
};
use wtstat_core::store::MissionStore;
use wtstat_core::types::{MissionId, Timestamp};

use crate::error::EngineError;

#[derive(Clone)]
pub struct MissionService {
    store: Arc<dyn MissionStore>,
}

impl MissionService {
    pub fn new(store: Arc<dyn MissionStore>) -> Self {
        Self { store }
    }

    /// Persist a pending mission under a fresh random id.
    ///
    /// Callers must not schedule work when this fails.
    pub async fn submit(
        &self,
        mission_type: MissionType,
        detail: MissionDetail,
    ) -> Result<MissionId, EngineError> {
        let input = NewMission {
            id: uuid::Uuid::new_v4(),
            mission_type,
            detail,
        };
        let mission = self.store.create(&input).await?;
        tracing::debug!(
            mission_id = %mission.id,
            mission_type = mission.mission_type.as_str(),
            "Mission submitted",
        );
        Ok(mission.id)
    }

    /// Write the terminal status and result of a pending mission.
    pub async fn finalize(
        &self,
        id: MissionId,
        status: MissionStatus,
        result: MissionResult,
    ) -> Result<(), EngineError> {
        state_machine::validate_transition(MissionStatus::Pending, status)?;

        if self.store.set_terminal(id, status, &result).await? {
            tracing::debug!(mission_id = %id, status = status.as_str(), "Mission finalized");
            return Ok(());
        }
        match self.store.get(id).await? {
            Some(_) => Err(EngineError::AlreadyFinalized(id)),
            None => Err(EngineError::MissionNotFound(id)),
        }
    }

    pub async fn find(&self, id: MissionId) -> Result<Mission, EngineError> {
        self.store
            .get(id)
            .await?
            .ok_or(EngineError::MissionNotFound(id))
    }

    pub async fn count_created_after(&self, after: Timestamp) -> Result<i64, EngineError> {
        Ok(self.store.count_created_after(after).await?)
    }

    pub async fn list_for_nickname(&self, nickname: &str) -> Result<Vec<Mission>, EngineError> {
        Ok(self.store.list_for_nickname(nickname).await?)
    }
}
