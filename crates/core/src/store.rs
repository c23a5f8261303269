//! Durable store seams.
//!
//! Every participant (API instance, crawl task, completion waiter) talks to
//! the others only through these traits. Implementations must give
//! read-after-write consistency for a single key.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::mission::{Mission, MissionResult, MissionStatus, NewMission};
use crate::profile::{NewProfile, Profile, ProfileUpdate};
use crate::quota::{CounterKey, GlobalSwitch};
use crate::types::{AccountId, MissionId, Timestamp};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, nickname: &str) -> Result<Option<Profile>, StoreError>;

    /// Insert a new profile. Fails with [`StoreError::AlreadyExists`] when a
    /// row for the nickname is already present.
    async fn create(&self, profile: &NewProfile) -> Result<Profile, StoreError>;

    /// Update in place. Returns `None` when no row exists for `nickname`.
    async fn update(
        &self,
        nickname: &str,
        fields: &ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError>;
}

#[async_trait]
pub trait MissionStore: Send + Sync {
    async fn create(&self, mission: &NewMission) -> Result<Mission, StoreError>;

    async fn get(&self, id: MissionId) -> Result<Option<Mission>, StoreError>;

    /// Move a pending mission to `status` with `result`.
    ///
    /// Returns `false` without writing when the mission is missing or
    /// already terminal, so the first terminal result is never overwritten.
    async fn set_terminal(
        &self,
        id: MissionId,
        status: MissionStatus,
        result: &MissionResult,
    ) -> Result<bool, StoreError>;

    async fn count_created_after(&self, after: Timestamp) -> Result<i64, StoreError>;

    /// Missions whose detail names `nickname`, newest first.
    async fn list_for_nickname(&self, nickname: &str) -> Result<Vec<Mission>, StoreError>;
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically add `n` (which may be negative) and return the new value.
    async fn increment(&self, key: &CounterKey, n: i64) -> Result<i64, StoreError>;

    /// Atomically add one unless the counter already reached `limit`.
    /// Returns the new value, or `None` without writing when at the limit.
    async fn increment_below(
        &self,
        key: &CounterKey,
        limit: i64,
    ) -> Result<Option<i64>, StoreError>;

    /// Current value, `0` for a counter never incremented.
    async fn get(&self, key: &CounterKey) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait SwitchStore: Send + Sync {
    /// Current value, `false` when never set.
    async fn get_switch(&self, switch: GlobalSwitch) -> Result<bool, StoreError>;

    async fn set_switch(&self, switch: GlobalSwitch, value: bool) -> Result<(), StoreError>;
}

#[async_trait]
pub trait BindingStore: Send + Sync {
    /// Nickname bound to `user_id`, if any.
    async fn resolve_self_alias(&self, user_id: AccountId) -> Result<Option<String>, StoreError>;

    /// Bind `nickname` to `user_id`. Returns `false` when the user already
    /// has a binding.
    async fn bind(&self, user_id: AccountId, nickname: &str) -> Result<bool, StoreError>;

    async fn unbind(&self, user_id: AccountId) -> Result<(), StoreError>;
}
