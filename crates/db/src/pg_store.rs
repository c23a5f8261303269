//! PostgreSQL implementation of the `wtstat_core::store` traits.

use async_trait::async_trait;
use wtstat_core::error::StoreError;
use wtstat_core::mission::{Mission, MissionResult, MissionStatus, NewMission};
use wtstat_core::profile::{NewProfile, Profile, ProfileUpdate};
use wtstat_core::quota::{CounterKey, GlobalSwitch};
use wtstat_core::store::{BindingStore, CounterStore, MissionStore, ProfileStore, SwitchStore};
use wtstat_core::types::{AccountId, MissionId, Timestamp};

use crate::repositories::{BindingRepo, CounterRepo, GlobalConfigRepo, MissionRepo, ProfileRepo};
use crate::{store_error, DbPool};

/// Cheaply cloneable handle over a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn find(&self, nickname: &str) -> Result<Option<Profile>, StoreError> {
        let row = ProfileRepo::find_by_nickname(&self.pool, nickname)
            .await
            .map_err(store_error)?;
        Ok(row.map(Profile::from))
    }

    async fn create(&self, profile: &NewProfile) -> Result<Profile, StoreError> {
        let row = ProfileRepo::create(&self.pool, profile)
            .await
            .map_err(store_error)?;
        Ok(row.into())
    }

    async fn update(
        &self,
        nickname: &str,
        fields: &ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        let row = ProfileRepo::update(&self.pool, nickname, fields)
            .await
            .map_err(store_error)?;
        Ok(row.map(Profile::from))
    }
}

#[async_trait]
impl MissionStore for PgStore {
    async fn create(&self, mission: &NewMission) -> Result<Mission, StoreError> {
        MissionRepo::create(&self.pool, mission)
            .await
            .map_err(store_error)?
            .into_domain()
    }

    async fn get(&self, id: MissionId) -> Result<Option<Mission>, StoreError> {
        MissionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?
            .map(|row| row.into_domain())
            .transpose()
    }

    async fn set_terminal(
        &self,
        id: MissionId,
        status: MissionStatus,
        result: &MissionResult,
    ) -> Result<bool, StoreError> {
        MissionRepo::set_terminal(&self.pool, id, status, &result.to_value())
            .await
            .map_err(store_error)
    }

    async fn count_created_after(&self, after: Timestamp) -> Result<i64, StoreError> {
        MissionRepo::count_created_after(&self.pool, after)
            .await
            .map_err(store_error)
    }

    async fn list_for_nickname(&self, nickname: &str) -> Result<Vec<Mission>, StoreError> {
        MissionRepo::list_for_nickname(&self.pool, nickname)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(|row| row.into_domain())
            .collect()
    }
}

#[async_trait]
impl CounterStore for PgStore {
    async fn increment(&self, key: &CounterKey, n: i64) -> Result<i64, StoreError> {
        CounterRepo::increment(&self.pool, &key.as_key(), n)
            .await
            .map_err(store_error)
    }

    async fn increment_below(
        &self,
        key: &CounterKey,
        limit: i64,
    ) -> Result<Option<i64>, StoreError> {
        CounterRepo::increment_below(&self.pool, &key.as_key(), limit)
            .await
            .map_err(store_error)
    }

    async fn get(&self, key: &CounterKey) -> Result<i64, StoreError> {
        CounterRepo::get(&self.pool, &key.as_key())
            .await
            .map_err(store_error)
    }
}

#[async_trait]
impl SwitchStore for PgStore {
    async fn get_switch(&self, switch: GlobalSwitch) -> Result<bool, StoreError> {
        let value = GlobalConfigRepo::get(&self.pool, switch.key())
            .await
            .map_err(store_error)?;
        Ok(value.is_some_and(|v| v.eq_ignore_ascii_case("true")))
    }

    async fn set_switch(&self, switch: GlobalSwitch, value: bool) -> Result<(), StoreError> {
        let value = if value { "true" } else { "false" };
        GlobalConfigRepo::upsert(&self.pool, switch.key(), value)
            .await
            .map_err(store_error)
    }
}

#[async_trait]
impl BindingStore for PgStore {
    async fn resolve_self_alias(&self, user_id: AccountId) -> Result<Option<String>, StoreError> {
        let nickname = BindingRepo::find_nickname(&self.pool, user_id)
            .await
            .map_err(store_error)?;
        Ok(nickname.filter(|n| !n.is_empty()))
    }

    async fn bind(&self, user_id: AccountId, nickname: &str) -> Result<bool, StoreError> {
        BindingRepo::insert(&self.pool, user_id, nickname)
            .await
            .map_err(store_error)
    }

    async fn unbind(&self, user_id: AccountId) -> Result<(), StoreError> {
        BindingRepo::delete(&self.pool, user_id)
            .await
            .map_err(store_error)
    }
}
