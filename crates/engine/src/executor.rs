//! Dual-source crawl execution.
//!
//! One run finalizes its mission exactly once:
//!
//! 1. Fetch the primary source. A not-found marker finalizes `success` with
//!    `found = false`; a transport or parse failure finalizes `failed`.
//! 2. Upsert the profile under the requested nickname.
//! 3. Fetch the secondary source best-effort and merge the mode ratings.
//! 4. Finalize `success` with the profile snapshot.

use std::sync::Arc;

use wtstat_core::error::StoreError;
use wtstat_core::mission::{CrawlResult, MissionResult, MissionStatus};
use wtstat_core::profile::{ModeRatings, NewProfile, Profile, ProfileUpdate};
use wtstat_core::store::ProfileStore;
use wtstat_core::types::MissionId;
use wtstat_crawler::{
    secondary, CrawlerConfig, ParseError, PrimaryOutcome, PrimaryParser, PrimarySelectors,
    ScrapeTransport,
};

use crate::error::EngineError;
use crate::mission::MissionService;

pub struct CrawlExecutor {
    profiles: Arc<dyn ProfileStore>,
    missions: MissionService,
    transport: Arc<dyn ScrapeTransport>,
    parser: PrimaryParser,
    primary_url: String,
    secondary_url: String,
}

impl CrawlExecutor {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        missions: MissionService,
        transport: Arc<dyn ScrapeTransport>,
        config: &CrawlerConfig,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            profiles,
            missions,
            transport,
            parser: PrimaryParser::new(PrimarySelectors::default(), &config.primary_url)?,
            primary_url: config.primary_url.clone(),
            secondary_url: config.secondary_url.clone(),
        })
    }

    /// Run the crawl and finalize `mission_id`. Never returns an error: a
    /// failed finalize is logged and leaves the mission pending.
    pub async fn run(&self, mission_id: MissionId, nickname: &str) {
        let (status, result) = self.crawl(mission_id, nickname).await;
        self.finish(mission_id, status, result).await;
    }

    /// Finalize a mission whose crawl task died before reaching a result.
    pub async fn fail(&self, mission_id: MissionId, nickname: &str, reason: &str) {
        let result = CrawlResult::failed(nickname, None, reason);
        self.finish(mission_id, MissionStatus::Failed, result).await;
    }

    async fn finish(&self, mission_id: MissionId, status: MissionStatus, result: CrawlResult) {
        match self
            .missions
            .finalize(mission_id, status, MissionResult::Crawl(result))
            .await
        {
            Ok(()) => {}
            Err(EngineError::AlreadyFinalized(_)) => {
                tracing::warn!(mission_id = %mission_id, "Mission was already finalized");
            }
            Err(e) => {
                tracing::error!(
                    mission_id = %mission_id,
                    error = %e,
                    "Failed to finalize mission, it stays pending",
                );
            }
        }
    }

    async fn crawl(&self, mission_id: MissionId, nickname: &str) -> (MissionStatus, CrawlResult) {
        let request = match PrimaryParser::request(&self.primary_url, nickname) {
            Ok(request) => request,
            Err(e) => {
                return (
                    MissionStatus::Failed,
                    CrawlResult::failed(nickname, None, e.to_string()),
                )
            }
        };

        let body = match self.transport.fetch(&request).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    mission_id = %mission_id,
                    nickname,
                    error = %e,
                    "Primary source request failed",
                );
                return (
                    MissionStatus::Failed,
                    CrawlResult::failed(nickname, e.status(), e.to_string()),
                );
            }
        };

        let extract = match self.parser.parse(&body, nickname) {
            Ok(PrimaryOutcome::NotFound) => {
                tracing::info!(mission_id = %mission_id, nickname, "Profile not found");
                return (MissionStatus::Success, CrawlResult::not_found(nickname));
            }
            Ok(PrimaryOutcome::Found(extract)) => extract,
            Err(e) => {
                tracing::warn!(
                    mission_id = %mission_id,
                    nickname,
                    error = %e,
                    "Primary source page could not be parsed",
                );
                return (
                    MissionStatus::Failed,
                    CrawlResult::failed(nickname, None, e.to_string()),
                );
            }
        };

        let profile = match self.upsert(&extract).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(
                    mission_id = %mission_id,
                    nickname,
                    error = %e,
                    "Profile write failed",
                );
                return (
                    MissionStatus::Failed,
                    CrawlResult::failed(nickname, None, "profile write failed"),
                );
            }
        };

        let profile = self.merge_ratings(mission_id, profile).await;
        (
            MissionStatus::Success,
            CrawlResult::found(nickname, profile).with_stats(extract.stats),
        )
    }

    /// Create-if-absent, else update in place. A concurrent create for the
    /// same nickname falls back to an update.
    async fn upsert(&self, extract: &NewProfile) -> Result<Profile, StoreError> {
        let fields = ProfileUpdate::identity(extract);
        if self.profiles.find(&extract.nickname).await?.is_none() {
            match self.profiles.create(extract).await {
                Ok(profile) => return Ok(profile),
                Err(StoreError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.profiles
            .update(&extract.nickname, &fields)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("profile {} vanished", extract.nickname)))
    }

    /// Best-effort secondary source merge; returns the latest snapshot.
    async fn merge_ratings(&self, mission_id: MissionId, profile: Profile) -> Profile {
        let nickname = profile.nickname.clone();
        let ratings = self.fetch_ratings(&nickname).await;

        let ratings = match ratings {
            Ok(ratings) => ratings,
            Err(e) => {
                tracing::warn!(
                    mission_id = %mission_id,
                    nickname = %nickname,
                    error = %e,
                    "Secondary source skipped",
                );
                return profile;
            }
        };

        match self
            .profiles
            .update(&nickname, &ProfileUpdate::ratings(ratings))
            .await
        {
            Ok(Some(updated)) => updated,
            Ok(None) => profile,
            Err(e) => {
                tracing::warn!(
                    mission_id = %mission_id,
                    nickname = %nickname,
                    error = %e,
                    "Rating merge failed",
                );
                profile
            }
        }
    }

    async fn fetch_ratings(&self, nickname: &str) -> Result<ModeRatings, String> {
        let request = secondary::request(&self.secondary_url, nickname).map_err(|e| e.to_string())?;
        let body = self
            .transport
            .fetch(&request)
            .await
            .map_err(|e| e.to_string())?;
        secondary::parse_ratings(&body).map_err(|e| e.to_string())
    }
}
