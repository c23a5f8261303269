//! Caller-facing operations: query, refresh, mission lookup, bindings and
//! switches.
//!
//! Admission order for both query and refresh:
//! global switch, self alias, nickname validity, refresh cooldown (refresh
//! only), group limit, user limit. A query whose profile is cached returns
//! it without crawling; everything else submits a mission and detaches a
//! crawl task, plus a completion waiter when the caller wants a reply.

use std::sync::Arc;

use chrono::Utc;
use wtstat_core::messages;
use wtstat_core::mission::{Mission, MissionDetail, MissionType, ReplyRoute};
use wtstat_core::profile::{MessageStyle, Profile};
use wtstat_core::quota::{
    refresh_allowed, GlobalSwitch, GlobalSwitches, QuotaSubject, Rejection, Usage,
};
use wtstat_core::types::{AccountId, MissionId, Timestamp};

use crate::error::EngineError;
use crate::executor::CrawlExecutor;
use crate::gate::QuotaGate;
use crate::mission::MissionService;
use crate::supervise::{spawn_logged, spawn_supervised};
use crate::waiter::CompletionWaiter;
use crate::Stores;

/// Where and how to deliver the completion message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub route: ReplyRoute,
    pub style: MessageStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub nickname: String,
    /// Charged for the attempt. Anonymous callers skip the counters.
    pub subject: Option<QuotaSubject>,
    pub reply: Option<ReplyRequest>,
}

impl QueryRequest {
    /// Anonymous request without a reply route.
    pub fn anonymous(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            subject: None,
            reply: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Cached(Profile),
    Submitted(MissionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    AlreadyBound,
    UnknownNickname,
}

impl BindOutcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::Bound => messages::BINDING_SUCCESS,
            Self::AlreadyBound => messages::BINDING_EXISTS,
            Self::UnknownNickname => messages::BINDING_UNKNOWN_NICKNAME,
        }
    }
}

pub struct Orchestrator {
    stores: Stores,
    gate: QuotaGate,
    missions: MissionService,
    executor: Arc<CrawlExecutor>,
    waiter: Arc<CompletionWaiter>,
    refresh_cooldown: chrono::Duration,
}

impl Orchestrator {
    pub fn new(
        stores: Stores,
        gate: QuotaGate,
        executor: Arc<CrawlExecutor>,
        waiter: Arc<CompletionWaiter>,
        refresh_cooldown: chrono::Duration,
    ) -> Self {
        let missions = MissionService::new(Arc::clone(&stores.missions));
        Self {
            stores,
            gate,
            missions,
            executor,
            waiter,
            refresh_cooldown,
        }
    }

    // -----------------------------------------------------------------------
    // Query / refresh
    // -----------------------------------------------------------------------

    /// Return the cached profile, or start a crawl when none exists.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryOutcome, EngineError> {
        self.gate.ensure_open().await?;
        let nickname = self
            .gate
            .resolve_nickname(&request.nickname, request.subject.as_ref())
            .await?;
        if let Some(subject) = &request.subject {
            self.gate.charge(subject).await?;
        }

        if let Some(profile) = self.stores.profiles.find(&nickname).await? {
            tracing::debug!(nickname = %nickname, "Profile served from store");
            return Ok(QueryOutcome::Cached(profile));
        }
        let mission_id = self.start_crawl(nickname, request.reply).await?;
        Ok(QueryOutcome::Submitted(mission_id))
    }

    /// Start a crawl even when a profile exists, unless it is too fresh.
    pub async fn refresh(&self, request: QueryRequest) -> Result<MissionId, EngineError> {
        self.gate.ensure_open().await?;
        let nickname = self
            .gate
            .resolve_nickname(&request.nickname, request.subject.as_ref())
            .await?;

        if let Some(profile) = self.stores.profiles.find(&nickname).await? {
            if !refresh_allowed(profile.updated_at, Utc::now(), self.refresh_cooldown) {
                return Err(Rejection::TooSoonToRefresh.into());
            }
        }
        if let Some(subject) = &request.subject {
            self.gate.charge(subject).await?;
        }
        self.start_crawl(nickname, request.reply).await
    }

    pub async fn submit_refresh(&self, nickname: &str) -> Result<MissionId, EngineError> {
        self.refresh(QueryRequest::anonymous(nickname)).await
    }

    async fn start_crawl(
        &self,
        nickname: String,
        reply: Option<ReplyRequest>,
    ) -> Result<MissionId, EngineError> {
        let detail = MissionDetail::profile_crawl(
            nickname.clone(),
            reply.as_ref().map(|r| r.route.clone()),
        );
        let mission_id = self.missions.submit(MissionType::UserInfo, detail).await?;
        tracing::info!(mission_id = %mission_id, nickname = %nickname, "Crawl scheduled");

        let executor = Arc::clone(&self.executor);
        let recovery = Arc::clone(&self.executor);
        let crawl_nick = nickname.clone();
        spawn_supervised(
            "crawl",
            async move { executor.run(mission_id, &crawl_nick).await },
            move |panic| async move {
                recovery
                    .fail(mission_id, &nickname, &format!("crawl task panicked: {panic}"))
                    .await;
            },
        );

        if let Some(reply) = reply {
            let waiter = Arc::clone(&self.waiter);
            spawn_logged("wait", async move {
                waiter.wait(mission_id, &reply.route, reply.style).await;
            });
        }
        Ok(mission_id)
    }

    // -----------------------------------------------------------------------
    // Missions
    // -----------------------------------------------------------------------

    pub async fn get_mission_result(&self, id: MissionId) -> Result<Mission, EngineError> {
        self.missions.find(id).await
    }

    pub async fn count_missions_created_after(&self, after: Timestamp) -> Result<i64, EngineError> {
        self.missions.count_created_after(after).await
    }

    /// Every mission submitted for `nickname`, newest first.
    pub async fn list_missions_for_nickname(
        &self,
        nickname: &str,
    ) -> Result<Vec<Mission>, EngineError> {
        self.missions.list_for_nickname(nickname).await
    }

    // -----------------------------------------------------------------------
    // Bindings
    // -----------------------------------------------------------------------

    pub async fn bind(&self, user_id: AccountId, nickname: &str) -> Result<BindOutcome, EngineError> {
        let nickname = self.gate.resolve_nickname(nickname, None).await?;
        if self.stores.profiles.find(&nickname).await?.is_none() {
            return Ok(BindOutcome::UnknownNickname);
        }
        if self.stores.bindings.bind(user_id, &nickname).await? {
            tracing::info!(user_id, nickname = %nickname, "Nickname bound");
            Ok(BindOutcome::Bound)
        } else {
            Ok(BindOutcome::AlreadyBound)
        }
    }

    pub async fn unbind(&self, user_id: AccountId) -> Result<(), EngineError> {
        self.stores.bindings.unbind(user_id).await?;
        tracing::info!(user_id, "Nickname unbound");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Switches and usage
    // -----------------------------------------------------------------------

    pub async fn set_switch(&self, switch: GlobalSwitch, value: bool) -> Result<(), EngineError> {
        self.gate.set_switch(switch, value).await
    }

    pub async fn get_switches(&self) -> Result<GlobalSwitches, EngineError> {
        self.gate.switches().await
    }

    /// Whether the chat surface should reply at all.
    pub async fn responses_enabled(&self) -> Result<bool, EngineError> {
        Ok(!self
            .stores
            .switches
            .get_switch(GlobalSwitch::StopAllResponses)
            .await?)
    }

    pub async fn group_usage(&self, group_id: AccountId) -> Result<Usage, EngineError> {
        self.gate.group_usage(group_id).await
    }

    pub async fn user_usage(&self, user_id: AccountId) -> Result<Usage, EngineError> {
        self.gate.user_usage(user_id).await
    }
}
