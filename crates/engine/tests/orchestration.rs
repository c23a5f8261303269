//! Query and refresh flows end to end over the in-memory store.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Duration;
use common::*;
use tokio::sync::Notify;
use wtstat_core::error::StoreError;
use wtstat_core::messages;
use wtstat_core::mission::MissionStatus;
use wtstat_core::profile::MessageStyle;
use wtstat_core::quota::{CounterKey, GlobalSwitch, QuotaLimits, QuotaSubject, Rejection, Usage};
use wtstat_core::store::{CounterStore, ProfileStore};
use wtstat_db::MemoryStore;
use wtstat_engine::gate::QuotaGate;
use wtstat_engine::{BindOutcome, EngineConfig, EngineError, QueryOutcome, QueryRequest, ReplyRequest};

fn subject(user_id: i64, group_id: i64) -> QuotaSubject {
    QuotaSubject {
        user_id,
        group_id: Some(group_id),
    }
}

fn bot_request(nickname: &str, user_id: i64, group_id: i64) -> QueryRequest {
    QueryRequest {
        nickname: nickname.to_string(),
        subject: Some(subject(user_id, group_id)),
        reply: Some(ReplyRequest {
            route: route(group_id, user_id),
            style: MessageStyle::Short,
        }),
    }
}

fn no_cooldown() -> EngineConfig {
    EngineConfig {
        refresh_cooldown: Duration::zero(),
        ..EngineConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Crawl scenarios
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn unknown_profile_is_crawled_and_reported() {
    let h = harness(EngineConfig::default());
    h.transport
        .set_primary("Ace01", FakeReply::Body(profile_page("TEST")));

    let outcome = h.orchestrator.query(bot_request("Ace01", 7, 42)).await.unwrap();
    let mission_id = assert_matches!(outcome, QueryOutcome::Submitted(id) => id);

    let mission = wait_for_terminal(&h.store, mission_id).await;
    assert_eq!(mission.status, MissionStatus::Success);
    let result = mission.result.as_ref().and_then(|r| r.as_crawl()).unwrap();
    assert!(result.found);
    assert_eq!(result.stats.user_stat.ab["Victories"], "120");

    let profile = ProfileStore::find(&*h.store, "Ace01").await.unwrap().unwrap();
    assert_eq!(profile.nickname, "Ace01");
    assert_eq!(profile.clan, "TEST");
    assert_eq!(profile.ts_rb_rate, 2.25);

    let sent = wait_for_messages(&h.dispatcher, 1).await;
    assert_eq!(sent, vec![profile.to_message(MessageStyle::Short)]);
    assert_eq!(h.dispatcher.routes(), vec![route(42, 7)]);
}

#[tokio::test(start_paused = true)]
async fn not_found_marker_reports_and_creates_nothing() {
    let h = harness(EngineConfig::default());

    let outcome = h.orchestrator.query(bot_request("ghost", 7, 42)).await.unwrap();
    let mission_id = assert_matches!(outcome, QueryOutcome::Submitted(id) => id);

    let mission = wait_for_terminal(&h.store, mission_id).await;
    assert_eq!(mission.status, MissionStatus::Success);
    assert!(!mission.result.unwrap().as_crawl().unwrap().found);

    let sent = wait_for_messages(&h.dispatcher, 1).await;
    assert_eq!(sent, vec![messages::PROFILE_NOT_FOUND.to_string()]);
    assert_eq!(h.store.profile_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn primary_http_error_fails_mission_with_status() {
    let h = harness(EngineConfig::default());
    h.transport.set_primary("Ace01", FakeReply::Status(503));

    let outcome = h.orchestrator.query(bot_request("Ace01", 7, 42)).await.unwrap();
    let mission_id = assert_matches!(outcome, QueryOutcome::Submitted(id) => id);

    let mission = wait_for_terminal(&h.store, mission_id).await;
    assert_eq!(mission.status, MissionStatus::Failed);
    let result = mission.result.unwrap();
    assert_eq!(result.as_crawl().unwrap().response_status, Some(503));

    let sent = wait_for_messages(&h.dispatcher, 1).await;
    assert_eq!(sent, vec![messages::QUERY_FAILED.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn unparseable_primary_page_fails_mission() {
    let h = harness(EngineConfig::default());
    h.transport
        .set_primary("Ace01", FakeReply::Body("<html>maintenance</html>".to_string()));

    let id = h.orchestrator.submit_refresh("Ace01").await.unwrap();
    let mission = wait_for_terminal(&h.store, id).await;

    assert_eq!(mission.status, MissionStatus::Failed);
    assert_eq!(h.store.profile_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn secondary_failure_still_succeeds() {
    let h = harness(EngineConfig::default());
    h.transport
        .set_primary("Ace01", FakeReply::Body(profile_page("TEST")));
    h.transport.set_secondary(FakeReply::Status(500));

    let id = h.orchestrator.submit_refresh("Ace01").await.unwrap();
    let mission = wait_for_terminal(&h.store, id).await;

    assert_eq!(mission.status, MissionStatus::Success);
    let profile = ProfileStore::find(&*h.store, "Ace01").await.unwrap().unwrap();
    assert_eq!(profile.ts_ab_rate, 0.0);
    assert_eq!(profile.clan, "TEST");
}

#[tokio::test(start_paused = true)]
async fn panicking_crawl_is_finalized_failed() {
    let h = harness(EngineConfig::default());
    h.transport.set_primary("Ace01", FakeReply::Panic);

    let id = h.orchestrator.submit_refresh("Ace01").await.unwrap();
    let mission = wait_for_terminal(&h.store, id).await;

    assert_eq!(mission.status, MissionStatus::Failed);
    let error = mission.result.unwrap().as_crawl().unwrap().error.clone();
    assert!(error.unwrap().contains("panicked"));
}

#[tokio::test(start_paused = true)]
async fn not_found_then_found_yields_one_profile() {
    let h = harness(no_cooldown());

    let first = h.orchestrator.submit_refresh("Late").await.unwrap();
    wait_for_terminal(&h.store, first).await;
    assert_eq!(h.store.profile_count().await, 0);

    h.transport
        .set_primary("Late", FakeReply::Body(profile_page("NEW")));
    for _ in 0..2 {
        let id = h.orchestrator.submit_refresh("Late").await.unwrap();
        wait_for_terminal(&h.store, id).await;
    }

    assert_eq!(h.store.profile_count().await, 1);
    let profile = ProfileStore::find(&*h.store, "Late").await.unwrap().unwrap();
    assert_eq!(profile.clan, "NEW");
}

#[tokio::test(start_paused = true)]
async fn overlapping_crawls_for_one_nickname_do_not_duplicate() {
    let h = harness(no_cooldown());
    h.transport
        .set_primary("Ace01", FakeReply::Body(profile_page("TEST")));

    let a = h.orchestrator.submit_refresh("Ace01").await.unwrap();
    let b = h.orchestrator.submit_refresh("Ace01").await.unwrap();
    assert_ne!(a, b);

    let ma = wait_for_terminal(&h.store, a).await;
    let mb = wait_for_terminal(&h.store, b).await;
    assert_eq!(ma.status, MissionStatus::Success);
    assert_eq!(mb.status, MissionStatus::Success);
    assert_eq!(h.store.profile_count().await, 1);
}

// ---------------------------------------------------------------------------
// Cache and cooldown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cached_profile_is_returned_without_crawl() {
    let h = harness(EngineConfig::default());
    h.store
        .put_profile(stored_profile("Ace01", Duration::hours(5)))
        .await;

    let outcome = h
        .orchestrator
        .query(QueryRequest::anonymous("Ace01"))
        .await
        .unwrap();

    let profile = assert_matches!(outcome, QueryOutcome::Cached(p) => p);
    assert_eq!(profile.nickname, "Ace01");
    assert_eq!(h.store.mission_count().await, 0);
    assert_eq!(h.transport.primary_calls(), 0);
}

#[tokio::test]
async fn fresh_profile_cannot_be_refreshed() {
    let h = harness(EngineConfig::default());
    h.store
        .put_profile(stored_profile("Ace01", Duration::minutes(5)))
        .await;

    let err = h.orchestrator.submit_refresh("Ace01").await.unwrap_err();
    assert_matches!(err, EngineError::Rejected(Rejection::TooSoonToRefresh));
    assert_eq!(h.store.mission_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn stale_profile_can_be_refreshed() {
    let h = harness(EngineConfig::default());
    h.store
        .put_profile(stored_profile("Ace01", Duration::hours(2)))
        .await;
    h.transport
        .set_primary("Ace01", FakeReply::Body(profile_page("FRESH")));

    let id = h.orchestrator.submit_refresh("Ace01").await.unwrap();
    wait_for_terminal(&h.store, id).await;

    let profile = ProfileStore::find(&*h.store, "Ace01").await.unwrap().unwrap();
    assert_eq!(profile.clan, "FRESH");
    assert_eq!(h.store.profile_count().await, 1);
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_at_daily_limit_is_rejected_before_submit() {
    let h = harness(EngineConfig::default());
    CounterStore::increment(&*h.store, &CounterKey::UserToday(7), 10)
        .await
        .unwrap();

    let err = h
        .orchestrator
        .refresh(bot_request("Ace01", 7, 42))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        EngineError::Rejected(Rejection::UserLimit { usage: 10, limit: 10 })
    );
    assert_eq!(h.store.mission_count().await, 0);
    assert_eq!(h.orchestrator.user_usage(7).await.unwrap().today, 10);
    assert_eq!(h.orchestrator.group_usage(42).await.unwrap(), Usage::default());
}

#[tokio::test]
async fn attempt_after_limit_is_rejected_with_usage() {
    let config = EngineConfig {
        limits: QuotaLimits {
            user_daily: 3,
            group_daily: 50,
        },
        ..EngineConfig::default()
    };
    let h = harness(config);
    h.store
        .put_profile(stored_profile("Ace01", Duration::hours(1)))
        .await;

    for _ in 0..3 {
        let mut request = bot_request("Ace01", 7, 42);
        request.reply = None;
        h.orchestrator.query(request).await.unwrap();
    }
    let err = h
        .orchestrator
        .query(bot_request("Ace01", 7, 42))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        EngineError::Rejected(Rejection::UserLimit { usage: 3, limit: 3 })
    );
    assert_eq!(
        h.orchestrator.user_usage(7).await.unwrap(),
        Usage { today: 3, total: 3 }
    );
    assert_eq!(
        h.orchestrator.group_usage(42).await.unwrap(),
        Usage { today: 3, total: 3 }
    );
}

#[tokio::test]
async fn group_limit_is_checked_before_user_limit() {
    let config = EngineConfig {
        limits: QuotaLimits {
            user_daily: 1,
            group_daily: 1,
        },
        ..EngineConfig::default()
    };
    let h = harness(config);
    CounterStore::increment(&*h.store, &CounterKey::GroupToday(42), 1)
        .await
        .unwrap();
    CounterStore::increment(&*h.store, &CounterKey::UserToday(7), 1)
        .await
        .unwrap();

    let err = h
        .orchestrator
        .query(bot_request("Ace01", 7, 42))
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Rejected(Rejection::GroupLimit { usage: 1, limit: 1 }));
}

#[tokio::test]
async fn user_rejection_leaves_group_uncharged() {
    let config = EngineConfig {
        limits: QuotaLimits {
            user_daily: 1,
            group_daily: 5,
        },
        ..EngineConfig::default()
    };
    let h = harness(config);
    CounterStore::increment(&*h.store, &CounterKey::UserToday(7), 1)
        .await
        .unwrap();

    let err = h
        .orchestrator
        .query(bot_request("Ace01", 7, 42))
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Rejected(Rejection::UserLimit { .. }));
    assert_eq!(h.orchestrator.group_usage(42).await.unwrap().today, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admissions_never_exceed_limit() {
    let store = Arc::new(MemoryStore::new());
    let gate = Arc::new(QuotaGate::new(
        store.clone(),
        store.clone(),
        store.clone(),
        QuotaLimits {
            user_daily: 10,
            group_daily: 100,
        },
    ));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..50 {
        let gate = Arc::clone(&gate);
        tasks.spawn(async move { gate.charge(&subject(7, 42)).await.is_ok() });
    }
    let mut admitted = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 10);
    assert_eq!(
        gate.user_usage(7).await.unwrap(),
        Usage { today: 10, total: 10 }
    );
    assert_eq!(gate.group_usage(42).await.unwrap().today, 10);
}

/// Counter store that parks the first operation on `key` until released.
struct PausingCounters {
    inner: Arc<MemoryStore>,
    key: CounterKey,
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

impl PausingCounters {
    fn new(inner: Arc<MemoryStore>, key: CounterKey) -> Self {
        Self {
            inner,
            key,
            armed: AtomicBool::new(true),
            reached: Notify::new(),
            release: Notify::new(),
        }
    }

    async fn pause(&self, key: &CounterKey) {
        if *key == self.key && self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl CounterStore for PausingCounters {
    async fn increment(&self, key: &CounterKey, n: i64) -> Result<i64, StoreError> {
        self.pause(key).await;
        CounterStore::increment(&*self.inner, key, n).await
    }

    async fn increment_below(
        &self,
        key: &CounterKey,
        limit: i64,
    ) -> Result<Option<i64>, StoreError> {
        self.pause(key).await;
        CounterStore::increment_below(&*self.inner, key, limit).await
    }

    async fn get(&self, key: &CounterKey) -> Result<i64, StoreError> {
        self.pause(key).await;
        CounterStore::get(&*self.inner, key).await
    }
}

#[tokio::test]
async fn user_at_limit_does_not_block_group_peers() {
    let store = Arc::new(MemoryStore::new());
    CounterStore::increment(&*store, &CounterKey::UserToday(1), 1)
        .await
        .unwrap();
    let counters = Arc::new(PausingCounters::new(
        Arc::clone(&store),
        CounterKey::UserToday(1),
    ));
    let gate = Arc::new(QuotaGate::new(
        counters.clone(),
        store.clone(),
        store.clone(),
        QuotaLimits {
            user_daily: 1,
            group_daily: 1,
        },
    ));

    let first = tokio::spawn({
        let gate = Arc::clone(&gate);
        async move { gate.charge(&subject(1, 42)).await }
    });
    counters.reached.notified().await;

    let second = gate.charge(&subject(2, 42)).await;
    counters.release.notify_one();
    let first = first.await.unwrap();

    assert_matches!(second, Ok(()));
    assert_matches!(
        first,
        Err(EngineError::Rejected(Rejection::UserLimit { usage: 1, limit: 1 }))
    );
    assert_eq!(
        gate.group_usage(42).await.unwrap(),
        Usage { today: 1, total: 1 }
    );
    assert_eq!(gate.user_usage(1).await.unwrap(), Usage { today: 1, total: 0 });
}

#[tokio::test]
async fn group_refusal_releases_the_user_slot() {
    let store = Arc::new(MemoryStore::new());
    let counters = Arc::new(PausingCounters::new(
        Arc::clone(&store),
        CounterKey::UserToday(1),
    ));
    let gate = Arc::new(QuotaGate::new(
        counters.clone(),
        store.clone(),
        store.clone(),
        QuotaLimits {
            user_daily: 5,
            group_daily: 1,
        },
    ));

    // The first attempt parks on its user check, after the group check
    // passed. A peer takes the last group slot meanwhile.
    let first = tokio::spawn({
        let gate = Arc::clone(&gate);
        async move { gate.charge(&subject(1, 42)).await }
    });
    counters.reached.notified().await;
    gate.charge(&subject(2, 42)).await.unwrap();
    counters.release.notify_one();

    let first = first.await.unwrap();
    assert_matches!(
        first,
        Err(EngineError::Rejected(Rejection::GroupLimit { usage: 1, limit: 1 }))
    );
    assert_eq!(gate.user_usage(1).await.unwrap(), Usage::default());
    assert_eq!(gate.group_usage(42).await.unwrap().today, 1);
}

/// Serves one stale read of the group counter and fails every release.
struct StaleGroupCounters {
    inner: Arc<MemoryStore>,
    stale_read: AtomicBool,
}

#[async_trait]
impl CounterStore for StaleGroupCounters {
    async fn increment(&self, key: &CounterKey, n: i64) -> Result<i64, StoreError> {
        if n < 0 {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        CounterStore::increment(&*self.inner, key, n).await
    }

    async fn increment_below(
        &self,
        key: &CounterKey,
        limit: i64,
    ) -> Result<Option<i64>, StoreError> {
        CounterStore::increment_below(&*self.inner, key, limit).await
    }

    async fn get(&self, key: &CounterKey) -> Result<i64, StoreError> {
        if matches!(key, CounterKey::GroupToday(_)) && self.stale_read.swap(false, Ordering::SeqCst)
        {
            return Ok(0);
        }
        CounterStore::get(&*self.inner, key).await
    }
}

#[tokio::test]
async fn failed_release_still_rejects_with_group_limit() {
    let store = Arc::new(MemoryStore::new());
    CounterStore::increment(&*store, &CounterKey::GroupToday(42), 1)
        .await
        .unwrap();
    let counters = Arc::new(StaleGroupCounters {
        inner: Arc::clone(&store),
        stale_read: AtomicBool::new(true),
    });
    let gate = QuotaGate::new(
        counters,
        store.clone(),
        store.clone(),
        QuotaLimits {
            user_daily: 5,
            group_daily: 1,
        },
    );

    let result = gate.charge(&subject(1, 42)).await;
    assert_matches!(
        result,
        Err(EngineError::Rejected(Rejection::GroupLimit { usage: 1, limit: 1 }))
    );
    // The release failed, so the slot stays taken.
    assert_eq!(gate.user_usage(1).await.unwrap(), Usage { today: 1, total: 0 });
}

#[tokio::test]
async fn stop_all_queries_rejects_first() {
    let h = harness(EngineConfig::default());
    h.orchestrator
        .set_switch(GlobalSwitch::StopAllQueries, true)
        .await
        .unwrap();

    let err = h
        .orchestrator
        .query(bot_request("not a valid nick!", 7, 42))
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Rejected(Rejection::QueriesDisabled));
    assert!(h.orchestrator.get_switches().await.unwrap().stop_all_queries);
    assert!(h.orchestrator.responses_enabled().await.unwrap());
}

#[tokio::test]
async fn invalid_nickname_is_rejected_without_charge() {
    let h = harness(EngineConfig::default());

    let err = h
        .orchestrator
        .query(bot_request("bad nick!", 7, 42))
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Rejected(Rejection::InvalidNickname));
    assert_eq!(h.orchestrator.user_usage(7).await.unwrap(), Usage::default());
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn self_alias_requires_binding() {
    let h = harness(EngineConfig::default());

    let err = h
        .orchestrator
        .query(bot_request("me", 7, 42))
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Rejected(Rejection::NoBoundNickname));
}

#[tokio::test]
async fn bound_alias_resolves_to_nickname() {
    let h = harness(EngineConfig::default());
    h.store
        .put_profile(stored_profile("Ace01", Duration::hours(1)))
        .await;

    assert_eq!(h.orchestrator.bind(7, "Ace01").await.unwrap(), BindOutcome::Bound);
    assert_eq!(
        h.orchestrator.bind(7, "Ace01").await.unwrap(),
        BindOutcome::AlreadyBound
    );

    let outcome = h.orchestrator.query(bot_request("me", 7, 42)).await.unwrap();
    let profile = assert_matches!(outcome, QueryOutcome::Cached(p) => p);
    assert_eq!(profile.nickname, "Ace01");

    h.orchestrator.unbind(7).await.unwrap();
    let err = h
        .orchestrator
        .query(bot_request("me", 7, 42))
        .await
        .unwrap_err();
    assert_matches!(err, EngineError::Rejected(Rejection::NoBoundNickname));
}

#[tokio::test]
async fn binding_unknown_profile_is_refused() {
    let h = harness(EngineConfig::default());
    assert_eq!(
        h.orchestrator.bind(7, "Nobody").await.unwrap(),
        BindOutcome::UnknownNickname
    );
}
