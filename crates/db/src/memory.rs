//! In-process implementation of the store traits.
//!
//! Semantics match [`PgStore`](crate::PgStore): unique nicknames, guarded
//! terminal writes, atomic counter increments. State lives only as long as
//! the value, so it suits single-instance runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use wtstat_core::error::StoreError;
use wtstat_core::mission::{state_machine, Mission, MissionResult, MissionStatus, NewMission};
use wtstat_core::profile::{NewProfile, Profile, ProfileUpdate};
use wtstat_core::quota::{CounterKey, GlobalSwitch};
use wtstat_core::store::{BindingStore, CounterStore, MissionStore, ProfileStore, SwitchStore};
use wtstat_core::types::{AccountId, MissionId, Timestamp};

#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<HashMap<String, Profile>>,
    missions: RwLock<HashMap<MissionId, Mission>>,
    counters: RwLock<HashMap<CounterKey, i64>>,
    switches: RwLock<HashMap<GlobalSwitch, bool>>,
    bindings: RwLock<HashMap<AccountId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles.
    pub async fn profile_count(&self) -> usize {
        self.profiles.read().await.len()
    }

    /// Number of stored missions.
    pub async fn mission_count(&self) -> usize {
        self.missions.read().await.len()
    }

    /// Insert or replace a profile as-is, timestamps included.
    pub async fn put_profile(&self, profile: Profile) {
        self.profiles
            .write()
            .await
            .insert(profile.nickname.clone(), profile);
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find(&self, nickname: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(nickname).cloned())
    }

    async fn create(&self, input: &NewProfile) -> Result<Profile, StoreError> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&input.nickname) {
            return Err(StoreError::AlreadyExists(
                "uq_game_profiles_nickname".to_string(),
            ));
        }
        let now = Utc::now();
        let profile = Profile {
            nickname: input.nickname.clone(),
            clan: input.clan.clone(),
            clan_url: input.clan_url.clone(),
            banned: input.banned,
            register_date: input.register_date,
            title: input.title.clone(),
            level: input.level,
            ts_ab_rate: 0.0,
            ts_rb_rate: 0.0,
            ts_sb_rate: 0.0,
            created_at: now,
            updated_at: now,
        };
        profiles.insert(profile.nickname.clone(), profile.clone());
        Ok(profile)
    }

    async fn update(
        &self,
        nickname: &str,
        fields: &ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles.get_mut(nickname).map(|profile| {
            fields.apply_to(profile);
            profile.updated_at = Utc::now();
            profile.clone()
        }))
    }
}

#[async_trait]
impl MissionStore for MemoryStore {
    async fn create(&self, input: &NewMission) -> Result<Mission, StoreError> {
        let mut missions = self.missions.write().await;
        if missions.contains_key(&input.id) {
            return Err(StoreError::AlreadyExists("missions_pkey".to_string()));
        }
        let now = Utc::now();
        let mission = Mission {
            id: input.id,
            mission_type: input.mission_type,
            status: MissionStatus::Pending,
            detail: input.detail.clone(),
            result: None,
            created_at: now,
            updated_at: now,
        };
        missions.insert(mission.id, mission.clone());
        Ok(mission)
    }

    async fn get(&self, id: MissionId) -> Result<Option<Mission>, StoreError> {
        Ok(self.missions.read().await.get(&id).cloned())
    }

    async fn set_terminal(
        &self,
        id: MissionId,
        status: MissionStatus,
        result: &MissionResult,
    ) -> Result<bool, StoreError> {
        let mut missions = self.missions.write().await;
        let Some(mission) = missions.get_mut(&id) else {
            return Ok(false);
        };
        if !state_machine::can_transition(mission.status, status) {
            return Ok(false);
        }
        mission.status = status;
        mission.result = Some(result.clone());
        mission.updated_at = Utc::now();
        Ok(true)
    }

    async fn count_created_after(&self, after: Timestamp) -> Result<i64, StoreError> {
        let missions = self.missions.read().await;
        Ok(missions.values().filter(|m| m.created_at > after).count() as i64)
    }

    async fn list_for_nickname(&self, nickname: &str) -> Result<Vec<Mission>, StoreError> {
        let missions = self.missions.read().await;
        let mut matching: Vec<Mission> = missions
            .values()
            .filter(|m| m.detail.nickname() == Some(nickname))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &CounterKey, n: i64) -> Result<i64, StoreError> {
        let mut counters = self.counters.write().await;
        let value = counters.entry(*key).or_insert(0);
        *value += n;
        Ok(*value)
    }

    async fn increment_below(
        &self,
        key: &CounterKey,
        limit: i64,
    ) -> Result<Option<i64>, StoreError> {
        let mut counters = self.counters.write().await;
        let value = counters.entry(*key).or_insert(0);
        if *value >= limit {
            return Ok(None);
        }
        *value += 1;
        Ok(Some(*value))
    }

    async fn get(&self, key: &CounterKey) -> Result<i64, StoreError> {
        Ok(self.counters.read().await.get(key).copied().unwrap_or(0))
    }
}

#[async_trait]
impl SwitchStore for MemoryStore {
    async fn get_switch(&self, switch: GlobalSwitch) -> Result<bool, StoreError> {
        Ok(self
            .switches
            .read()
            .await
            .get(&switch)
            .copied()
            .unwrap_or(false))
    }

    async fn set_switch(&self, switch: GlobalSwitch, value: bool) -> Result<(), StoreError> {
        self.switches.write().await.insert(switch, value);
        Ok(())
    }
}

#[async_trait]
impl BindingStore for MemoryStore {
    async fn resolve_self_alias(&self, user_id: AccountId) -> Result<Option<String>, StoreError> {
        Ok(self
            .bindings
            .read()
            .await
            .get(&user_id)
            .filter(|n| !n.is_empty())
            .cloned())
    }

    async fn bind(&self, user_id: AccountId, nickname: &str) -> Result<bool, StoreError> {
        let mut bindings = self.bindings.write().await;
        if bindings.contains_key(&user_id) {
            return Ok(false);
        }
        bindings.insert(user_id, nickname.to_string());
        Ok(true)
    }

    async fn unbind(&self, user_id: AccountId) -> Result<(), StoreError> {
        self.bindings.write().await.remove(&user_id);
        Ok(())
    }
}
