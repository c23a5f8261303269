//! Scrape transport and source parsers.
//!
//! - [`transport`]: the [`ScrapeTransport`] seam and its `reqwest`
//!   implementation (user-agent rotation, domain allow-list, single-hop
//!   redirects).
//! - [`primary`]: the official profile page (HTML with marker elements).
//! - [`secondary`]: the supplementary per-mode stats export (JSON).

pub mod config;
pub mod primary;
pub mod secondary;
pub mod transport;

pub use config::CrawlerConfig;
pub use primary::{PrimaryOutcome, PrimaryParser, PrimarySelectors};
pub use transport::{HttpTransport, ScrapeMethod, ScrapeRequest, ScrapeTransport, TransportError};

/// Errors from parsing a source response body.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid CSS selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Page has neither a profile block nor a not-found marker")]
    MissingProfileBlock,

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
