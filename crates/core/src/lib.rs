//! Domain types and rules for the wtstat crawl service.
//!
//! This crate has zero internal dependencies. Storage backends, the scrape
//! transport and the orchestration engine all build on the types and store
//! traits defined here.

pub mod error;
pub mod messages;
pub mod mission;
pub mod nickname;
pub mod profile;
pub mod quota;
pub mod store;
pub mod types;
