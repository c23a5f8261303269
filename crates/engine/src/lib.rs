//! Asynchronous crawl-mission orchestration.
//!
//! Submitters, crawl tasks and completion waiters share no memory; they
//! coordinate only through the durable stores bundled in [`Stores`].
//!
//! - [`mission`]: submit / finalize / find over the mission store.
//! - [`executor`]: dual-source crawl that finalizes a mission exactly once.
//! - [`waiter`]: bounded polling that turns a mission into one message.
//! - [`gate`]: switches, nickname rules and daily quotas.
//! - [`orchestrator`]: the caller-facing query and refresh operations.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod gate;
pub mod mission;
pub mod orchestrator;
pub mod supervise;
pub mod waiter;

use std::sync::Arc;

use wtstat_core::store::{BindingStore, CounterStore, MissionStore, ProfileStore, SwitchStore};
use wtstat_crawler::{CrawlerConfig, ParseError, ScrapeTransport};

pub use config::EngineConfig;
pub use dispatcher::{Dispatcher, HttpDispatcher, LogDispatcher};
pub use error::EngineError;
pub use orchestrator::{BindOutcome, Orchestrator, QueryOutcome, QueryRequest, ReplyRequest};

/// Handles to every durable store the engine touches.
#[derive(Clone)]
pub struct Stores {
    pub profiles: Arc<dyn ProfileStore>,
    pub missions: Arc<dyn MissionStore>,
    pub counters: Arc<dyn CounterStore>,
    pub switches: Arc<dyn SwitchStore>,
    pub bindings: Arc<dyn BindingStore>,
}

impl Stores {
    /// All five stores served by one backend.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: ProfileStore + MissionStore + CounterStore + SwitchStore + BindingStore + 'static,
    {
        Self {
            profiles: store.clone(),
            missions: store.clone(),
            counters: store.clone(),
            switches: store.clone(),
            bindings: store,
        }
    }
}

/// Wire the engine components over `stores`.
pub fn build_orchestrator(
    stores: Stores,
    transport: Arc<dyn ScrapeTransport>,
    dispatcher: Arc<dyn Dispatcher>,
    crawler: &CrawlerConfig,
    config: &EngineConfig,
) -> Result<Orchestrator, ParseError> {
    let missions = mission::MissionService::new(Arc::clone(&stores.missions));
    let executor = executor::CrawlExecutor::new(
        Arc::clone(&stores.profiles),
        missions.clone(),
        transport,
        crawler,
    )?;
    let waiter = waiter::CompletionWaiter::new(
        missions,
        Arc::clone(&stores.profiles),
        dispatcher,
        config.poll_interval,
        config.wait_budget,
    );
    let gate = gate::QuotaGate::new(
        Arc::clone(&stores.counters),
        Arc::clone(&stores.switches),
        Arc::clone(&stores.bindings),
        config.limits,
    );
    Ok(Orchestrator::new(
        stores,
        gate,
        Arc::new(executor),
        Arc::new(waiter),
        config.refresh_cooldown,
    ))
}
