//! Completion waiter: bounded polling of a mission's durable state.
//!
//! There is no push channel between the crawl task and the waiter; they
//! may run in different instances. The waiter sleeps one interval, reads
//! the mission, and repeats until a terminal status or the budget runs out.
//! Exactly one message is dispatched per wait.

use std::sync::Arc;
use std::time::Duration;

use wtstat_core::messages;
use wtstat_core::mission::{Mission, MissionStatus, ReplyRoute};
use wtstat_core::profile::MessageStyle;
use wtstat_core::store::ProfileStore;
use wtstat_core::types::MissionId;

use crate::config::max_polls;
use crate::dispatcher::Dispatcher;
use crate::mission::MissionService;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Profile,
    NotFound,
    Failed,
    TimedOut,
}

pub struct CompletionWaiter {
    missions: MissionService,
    profiles: Arc<dyn ProfileStore>,
    dispatcher: Arc<dyn Dispatcher>,
    poll_interval: Duration,
    budget: Duration,
}

impl CompletionWaiter {
    pub fn new(
        missions: MissionService,
        profiles: Arc<dyn ProfileStore>,
        dispatcher: Arc<dyn Dispatcher>,
        poll_interval: Duration,
        budget: Duration,
    ) -> Self {
        Self {
            missions,
            profiles,
            dispatcher,
            poll_interval,
            budget,
        }
    }

    /// Poll `mission_id` and send the resulting message to `route`.
    pub async fn wait(
        &self,
        mission_id: MissionId,
        route: &ReplyRoute,
        style: MessageStyle,
    ) -> (WaitOutcome, String) {
        let (outcome, text) = self.poll(mission_id, style).await;

        tracing::info!(
            mission_id = %mission_id,
            group_id = route.group_id,
            outcome = ?outcome,
            "Mission wait finished",
        );
        if let Err(e) = self.dispatcher.send(route, &text).await {
            tracing::warn!(mission_id = %mission_id, error = %e, "Message dispatch failed");
        }
        (outcome, text)
    }

    async fn poll(&self, mission_id: MissionId, style: MessageStyle) -> (WaitOutcome, String) {
        for attempt in 1..=max_polls(self.poll_interval, self.budget) {
            tokio::time::sleep(self.poll_interval).await;

            let mission = match self.missions.find(mission_id).await {
                Ok(mission) => mission,
                Err(e) => {
                    tracing::warn!(mission_id = %mission_id, attempt, error = %e, "Mission poll failed");
                    continue;
                }
            };

            if let Some(done) = self.resolve(&mission, style).await {
                return done;
            }
        }
        (WaitOutcome::TimedOut, messages::QUERY_TIMED_OUT.to_string())
    }

    /// Message for a terminal mission, `None` while it is still pending or
    /// the profile could not be read. A `success` mission is answered from
    /// the profile store whatever its `found` flag says.
    async fn resolve(&self, mission: &Mission, style: MessageStyle) -> Option<(WaitOutcome, String)> {
        match mission.status {
            MissionStatus::Pending => None,
            MissionStatus::Failed => Some((WaitOutcome::Failed, messages::QUERY_FAILED.to_string())),
            MissionStatus::Success => {
                let not_found = (WaitOutcome::NotFound, messages::PROFILE_NOT_FOUND.to_string());
                let Some(nickname) = mission.detail.nickname() else {
                    return Some(not_found);
                };
                match self.profiles.find(nickname).await {
                    Ok(Some(profile)) => Some((WaitOutcome::Profile, profile.to_message(style))),
                    Ok(None) => Some(not_found),
                    Err(e) => {
                        tracing::warn!(
                            mission_id = %mission.id,
                            nickname,
                            error = %e,
                            "Profile read failed",
                        );
                        None
                    }
                }
            }
        }
    }
}
