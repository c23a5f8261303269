//! Outbound messaging to chat groups.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use wtstat_core::mission::ReplyRoute;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gateway returned HTTP {0}")]
    Status(u16),
}

/// Delivers one text message to a reply route. Callers log failures and
/// never retry.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, route: &ReplyRoute, text: &str) -> Result<(), DispatchError>;
}

/// Prefix `text` with a mention of the route's user, if any.
pub fn with_mention(route: &ReplyRoute, text: &str) -> String {
    match route.user_id {
        Some(user_id) => format!("[CQ:at,qq={user_id}] {text}"),
        None => text.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct SendGroupMsg<'a> {
    group_id: i64,
    message: &'a str,
}

/// Posts to a OneBot-compatible gateway's `send_group_msg` endpoint.
pub struct HttpDispatcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDispatcher {
    pub fn new(gateway_url: &str) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/send_group_msg", gateway_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn send(&self, route: &ReplyRoute, text: &str) -> Result<(), DispatchError> {
        let message = with_mention(route, text);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendGroupMsg {
                group_id: route.group_id,
                message: &message,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DispatchError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Writes messages to the log. Used when no gateway is configured.
pub struct LogDispatcher;

#[async_trait]
impl Dispatcher for LogDispatcher {
    async fn send(&self, route: &ReplyRoute, text: &str) -> Result<(), DispatchError> {
        tracing::info!(
            group_id = route.group_id,
            user_id = ?route.user_id,
            message = %text,
            "Outbound message",
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_is_prefixed_only_with_user() {
        let group_only = ReplyRoute {
            group_id: 1,
            user_id: None,
        };
        let with_user = ReplyRoute {
            group_id: 1,
            user_id: Some(7),
        };
        assert_eq!(with_mention(&group_only, "hi"), "hi");
        assert_eq!(with_mention(&with_user, "hi"), "[CQ:at,qq=7] hi");
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let dispatcher = HttpDispatcher::new("http://127.0.0.1:5700/").unwrap();
        assert_eq!(dispatcher.endpoint, "http://127.0.0.1:5700/send_group_msg");
    }
}
