//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use wtstat_core::mission::{Mission, ReplyRoute};
use wtstat_core::profile::Profile;
use wtstat_core::store::MissionStore;
use wtstat_core::types::MissionId;
use wtstat_crawler::{CrawlerConfig, ScrapeRequest, ScrapeTransport, TransportError};
use wtstat_db::MemoryStore;
use wtstat_engine::dispatcher::{DispatchError, Dispatcher};
use wtstat_engine::{build_orchestrator, EngineConfig, Orchestrator, Stores};

pub const NOT_FOUND_PAGE: &str =
    r#"<html><body><div class="user__unavailable-title">User not found</div></body></html>"#;

pub const RATINGS_JSON: &str = r#"{"stats":{"a":{"kpd":1.5},"r":{"kpd":2.25},"s":{"kpd":0.5}}}"#;

/// Minimal found page for `clan`, with a masked nickname element.
pub fn profile_page(clan: &str) -> String {
    format!(
        r#"<html><body><div class="user-info"><ul>
        <li class="user-profile__data-nick">[email protected]</li>
        <li class="user-profile__data-clan"><a href="/en/community/claninfo/{clan}">{clan}</a></li>
        <li class="user-profile__data-title">Ace</li>
        <li class="user-profile__data-item">Level 100</li>
        <li class="user-profile__data-regdate">14.03.2015</li>
        </ul>
        <div class="user-stat">
          <ul class="profile-stat__list-titles"><li class="user-stat__list-item">Victories</li></ul>
          <ul class="arcadeFightTab"><li class="user-stat__list-item">120</li></ul>
        </div></div></body></html>"#
    )
}

/// A profile row last updated `age` ago.
pub fn stored_profile(nickname: &str, age: chrono::Duration) -> Profile {
    let at = Utc::now() - age;
    Profile {
        nickname: nickname.to_string(),
        clan: "TEST".to_string(),
        clan_url: String::new(),
        banned: false,
        register_date: None,
        title: String::new(),
        level: 10,
        ts_ab_rate: 0.0,
        ts_rb_rate: 0.0,
        ts_sb_rate: 0.0,
        created_at: at,
        updated_at: at,
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum FakeReply {
    Body(String),
    Status(u16),
    Panic,
}

/// Serves canned primary pages per nickname and one secondary reply.
/// Unknown nicknames get the not-found page.
pub struct FakeTransport {
    primary: Mutex<HashMap<String, FakeReply>>,
    secondary: Mutex<FakeReply>,
    primary_calls: AtomicUsize,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            primary: Mutex::new(HashMap::new()),
            secondary: Mutex::new(FakeReply::Body(RATINGS_JSON.to_string())),
            primary_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeTransport {
    pub fn set_primary(&self, nickname: &str, reply: FakeReply) {
        self.primary
            .lock()
            .unwrap()
            .insert(nickname.to_string(), reply);
    }

    pub fn set_secondary(&self, reply: FakeReply) {
        *self.secondary.lock().unwrap() = reply;
    }

    pub fn primary_calls(&self) -> usize {
        self.primary_calls.load(Ordering::SeqCst)
    }
}

fn answer(reply: FakeReply) -> Result<String, TransportError> {
    match reply {
        FakeReply::Body(body) => Ok(body),
        FakeReply::Status(status) => Err(TransportError::HttpStatus { status }),
        FakeReply::Panic => panic!("transport exploded"),
    }
}

#[async_trait]
impl ScrapeTransport for FakeTransport {
    async fn fetch(&self, request: &ScrapeRequest) -> Result<String, TransportError> {
        let host = request.url.host_str().unwrap_or_default();
        if host.ends_with("thunderskill.com") {
            let reply = self.secondary.lock().unwrap().clone();
            return answer(reply);
        }

        self.primary_calls.fetch_add(1, Ordering::SeqCst);
        let nick = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "nick")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        let reply = self
            .primary
            .lock()
            .unwrap()
            .get(&nick)
            .cloned()
            .unwrap_or_else(|| FakeReply::Body(NOT_FOUND_PAGE.to_string()));
        answer(reply)
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<(ReplyRoute, String)>>,
}

impl RecordingDispatcher {
    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn routes(&self) -> Vec<ReplyRoute> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(route, _)| route.clone())
            .collect()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn send(&self, route: &ReplyRoute, text: &str) -> Result<(), DispatchError> {
        self.sent
            .lock()
            .unwrap()
            .push((route.clone(), text.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub transport: Arc<FakeTransport>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub orchestrator: Orchestrator,
}

pub fn harness(config: EngineConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(FakeTransport::default());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let orchestrator = build_orchestrator(
        Stores::shared(Arc::clone(&store)),
        transport.clone(),
        dispatcher.clone(),
        &CrawlerConfig::default(),
        &config,
    )
    .unwrap();
    Harness {
        store,
        transport,
        dispatcher,
        orchestrator,
    }
}

pub fn route(group_id: i64, user_id: i64) -> ReplyRoute {
    ReplyRoute {
        group_id,
        user_id: Some(user_id),
    }
}

/// Poll the store until the mission is terminal.
pub async fn wait_for_terminal(store: &MemoryStore, id: MissionId) -> Mission {
    for _ in 0..600 {
        if let Some(mission) = MissionStore::get(store, id).await.unwrap() {
            if mission.status.is_terminal() {
                return mission;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("mission {id} never reached a terminal status");
}

/// Wait until `n` messages were dispatched.
pub async fn wait_for_messages(dispatcher: &RecordingDispatcher, n: usize) -> Vec<String> {
    for _ in 0..1000 {
        let messages = dispatcher.messages();
        if messages.len() >= n {
            return messages;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("expected {n} dispatched messages");
}
