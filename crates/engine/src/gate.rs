//! Quota gate: admission checks evaluated before any mission is created.
//!
//! Counters are charged with conditional increments that refuse to pass
//! the limit, so concurrent admissions never overshoot it. The group is
//! only charged once the user slot is held.

use std::sync::Arc;

use wtstat_core::nickname;
use wtstat_core::quota::{
    CounterKey, GlobalSwitch, GlobalSwitches, QuotaLimits, QuotaSubject, Rejection, Usage,
};
use wtstat_core::store::{BindingStore, CounterStore, SwitchStore};
use wtstat_core::types::AccountId;

use crate::error::EngineError;

pub struct QuotaGate {
    counters: Arc<dyn CounterStore>,
    switches: Arc<dyn SwitchStore>,
    bindings: Arc<dyn BindingStore>,
    limits: QuotaLimits,
}

impl QuotaGate {
    pub fn new(
        counters: Arc<dyn CounterStore>,
        switches: Arc<dyn SwitchStore>,
        bindings: Arc<dyn BindingStore>,
        limits: QuotaLimits,
    ) -> Self {
        Self {
            counters,
            switches,
            bindings,
            limits,
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// Reject when queries are globally disabled. Read from the shared
    /// store on every admission.
    pub async fn ensure_open(&self) -> Result<(), EngineError> {
        if self.switches.get_switch(GlobalSwitch::StopAllQueries).await? {
            return Err(Rejection::QueriesDisabled.into());
        }
        Ok(())
    }

    /// Resolve the self alias and validate the resulting nickname.
    pub async fn resolve_nickname(
        &self,
        raw: &str,
        subject: Option<&QuotaSubject>,
    ) -> Result<String, EngineError> {
        let nickname = if nickname::is_self_alias(raw) {
            let Some(subject) = subject else {
                return Err(Rejection::NoBoundNickname.into());
            };
            self.bindings
                .resolve_self_alias(subject.user_id)
                .await?
                .ok_or(Rejection::NoBoundNickname)?
        } else {
            raw.trim().to_string()
        };

        if !nickname::is_valid_nickname(&nickname) {
            return Err(Rejection::InvalidNickname.into());
        }
        Ok(nickname)
    }

    /// Charge one attempt to the group (if any) and the user.
    ///
    /// The limits are checked in order (group, then user) before anything
    /// is written. Admission then takes the user slot and the group slot,
    /// each with a conditional increment that never passes its limit, so a
    /// concurrent attempt never sees another user's pending reservation.
    pub async fn charge(&self, subject: &QuotaSubject) -> Result<(), EngineError> {
        if let Some(group_id) = subject.group_id {
            self.ensure_below(
                &CounterKey::GroupToday(group_id),
                self.limits.group_daily,
                |usage, limit| Rejection::GroupLimit { usage, limit },
            )
            .await?;
        }
        let user_key = CounterKey::UserToday(subject.user_id);
        self.ensure_below(&user_key, self.limits.user_daily, |usage, limit| {
            Rejection::UserLimit { usage, limit }
        })
        .await?;

        if self
            .counters
            .increment_below(&user_key, self.limits.user_daily)
            .await?
            .is_none()
        {
            return Err(Rejection::UserLimit {
                usage: self.counters.get(&user_key).await?,
                limit: self.limits.user_daily,
            }
            .into());
        }

        if let Some(group_id) = subject.group_id {
            let group_key = CounterKey::GroupToday(group_id);
            if self
                .counters
                .increment_below(&group_key, self.limits.group_daily)
                .await?
                .is_none()
            {
                self.release_user_slot(subject).await;
                return Err(Rejection::GroupLimit {
                    usage: self.counters.get(&group_key).await?,
                    limit: self.limits.group_daily,
                }
                .into());
            }
        }

        self.counters
            .increment(&CounterKey::UserTotal(subject.user_id), 1)
            .await?;
        if let Some(group_id) = subject.group_id {
            self.counters
                .increment(&CounterKey::GroupTotal(group_id), 1)
                .await?;
        }
        tracing::debug!(
            user_id = subject.user_id,
            group_id = ?subject.group_id,
            "Query charged",
        );
        Ok(())
    }

    async fn ensure_below(
        &self,
        key: &CounterKey,
        limit: i64,
        reject: impl FnOnce(i64, i64) -> Rejection,
    ) -> Result<(), EngineError> {
        let usage = self.counters.get(key).await?;
        if usage >= limit {
            return Err(reject(usage, limit).into());
        }
        Ok(())
    }

    /// Undo the user slot taken by an attempt the group then refused. A
    /// failed undo leaves the user charged; it is logged and the rejection
    /// still stands.
    async fn release_user_slot(&self, subject: &QuotaSubject) {
        let key = CounterKey::UserToday(subject.user_id);
        if let Err(e) = self.counters.increment(&key, -1).await {
            tracing::error!(
                user_id = subject.user_id,
                group_id = ?subject.group_id,
                error = %e,
                "Quota rollback failed, user stays charged",
            );
        }
    }

    pub async fn user_usage(&self, user_id: AccountId) -> Result<Usage, EngineError> {
        Ok(Usage {
            today: self.counters.get(&CounterKey::UserToday(user_id)).await?,
            total: self.counters.get(&CounterKey::UserTotal(user_id)).await?,
        })
    }

    pub async fn group_usage(&self, group_id: AccountId) -> Result<Usage, EngineError> {
        Ok(Usage {
            today: self.counters.get(&CounterKey::GroupToday(group_id)).await?,
            total: self.counters.get(&CounterKey::GroupTotal(group_id)).await?,
        })
    }

    pub async fn switches(&self) -> Result<GlobalSwitches, EngineError> {
        Ok(GlobalSwitches {
            stop_all_responses: self
                .switches
                .get_switch(GlobalSwitch::StopAllResponses)
                .await?,
            stop_all_queries: self.switches.get_switch(GlobalSwitch::StopAllQueries).await?,
        })
    }

    pub async fn set_switch(&self, switch: GlobalSwitch, value: bool) -> Result<(), EngineError> {
        self.switches.set_switch(switch, value).await?;
        tracing::info!(switch = switch.key(), value, "Global switch updated");
        Ok(())
    }
}
