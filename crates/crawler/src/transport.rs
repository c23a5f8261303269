//! HTTP transport for scraping the external sources.
//!
//! [`HttpTransport`] wraps a [`reqwest::Client`] configured with a request
//! timeout and a redirect policy that follows at most one hop, and only to
//! an allowed domain. Each request carries a randomly chosen user agent.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use reqwest::Url;

use crate::config::CrawlerConfig;

/// Maximum number of redirects followed per request.
const MAX_REDIRECT_HOPS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub method: ScrapeMethod,
    pub url: Url,
}

impl ScrapeRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: ScrapeMethod::Get,
            url,
        }
    }

    pub fn post(url: Url) -> Self {
        Self {
            method: ScrapeMethod::Post,
            url,
        }
    }
}

/// Errors from the scrape transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The target host is not on the allow-list.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The source returned a non-2xx status code.
    #[error("Source returned HTTP {status}")]
    HttpStatus { status: u16 },
}

impl TransportError {
    /// HTTP status associated with the failure, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            Self::DomainNotAllowed(_) => None,
        }
    }
}

/// Fetches a raw response body from an external source.
#[async_trait]
pub trait ScrapeTransport: Send + Sync {
    async fn fetch(&self, request: &ScrapeRequest) -> Result<String, TransportError>;
}

/// Whether `host` is one of `allowed` or a subdomain of one.
pub fn domain_allowed(allowed: &[String], host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    allowed.iter().any(|domain| {
        let domain = domain.to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    })
}

pub struct HttpTransport {
    client: reqwest::Client,
    user_agents: Vec<String>,
    allowed_domains: Vec<String>,
}

impl HttpTransport {
    pub fn new(config: &CrawlerConfig) -> Result<Self, TransportError> {
        let redirect_domains = config.allowed_domains.clone();
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() > MAX_REDIRECT_HOPS {
                return attempt.stop();
            }
            match attempt.url().host_str() {
                Some(host) if domain_allowed(&redirect_domains, host) => attempt.follow(),
                _ => attempt.stop(),
            }
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(policy)
            .build()?;

        Ok(Self {
            client,
            user_agents: config.user_agents.clone(),
            allowed_domains: config.allowed_domains.clone(),
        })
    }

    fn pick_user_agent(&self) -> Option<&str> {
        self.user_agents
            .choose(&mut rand::rng())
            .map(String::as_str)
    }
}

#[async_trait]
impl ScrapeTransport for HttpTransport {
    async fn fetch(&self, request: &ScrapeRequest) -> Result<String, TransportError> {
        let host = request.url.host_str().unwrap_or_default();
        if !domain_allowed(&self.allowed_domains, host) {
            return Err(TransportError::DomainNotAllowed(host.to_string()));
        }

        tracing::info!(url = %request.url, "Start visiting");

        let mut builder = match request.method {
            ScrapeMethod::Get => self.client.get(request.url.clone()),
            ScrapeMethod::Post => self.client.post(request.url.clone()),
        };
        if let Some(agent) = self.pick_user_agent() {
            builder = builder.header(USER_AGENT, agent);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %request.url, status = status.as_u16(), "Visiting failed");
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
