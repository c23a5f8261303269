use std::time::Duration;

use wtstat_core::quota::QuotaLimits;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay between two completion-waiter polls (default: 3s).
    pub poll_interval: Duration,
    /// Total time a waiter keeps polling before giving up (default: 60s).
    pub wait_budget: Duration,
    pub limits: QuotaLimits,
    /// Minimum profile age before a forced refresh is admitted.
    pub refresh_cooldown: chrono::Duration,
    /// Base URL of the chat gateway. `None` logs outbound messages instead.
    pub bot_gateway_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            wait_budget: Duration::from_secs(60),
            limits: QuotaLimits {
                user_daily: 10,
                group_daily: 50,
            },
            refresh_cooldown: chrono::Duration::seconds(1800),
            bot_gateway_url: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `WAITER_POLL_INTERVAL_SECS` | `3`     |
    /// | `WAITER_BUDGET_SECS`        | `60`    |
    /// | `USER_DAILY_QUERY_LIMIT`    | `10`    |
    /// | `GROUP_DAILY_QUERY_LIMIT`   | `50`    |
    /// | `REFRESH_COOLDOWN_SECS`     | `1800`  |
    /// | `BOT_GATEWAY_URL`           | unset   |
    pub fn from_env() -> Self {
        let poll_secs: u64 = std::env::var("WAITER_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("WAITER_POLL_INTERVAL_SECS must be a valid u64");

        let budget_secs: u64 = std::env::var("WAITER_BUDGET_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("WAITER_BUDGET_SECS must be a valid u64");

        let user_daily: i64 = std::env::var("USER_DAILY_QUERY_LIMIT")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("USER_DAILY_QUERY_LIMIT must be a valid i64");

        let group_daily: i64 = std::env::var("GROUP_DAILY_QUERY_LIMIT")
            .unwrap_or_else(|_| "50".into())
            .parse()
            .expect("GROUP_DAILY_QUERY_LIMIT must be a valid i64");

        let cooldown_secs: i64 = std::env::var("REFRESH_COOLDOWN_SECS")
            .unwrap_or_else(|_| "1800".into())
            .parse()
            .expect("REFRESH_COOLDOWN_SECS must be a valid i64");

        let bot_gateway_url = std::env::var("BOT_GATEWAY_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        Self {
            poll_interval: Duration::from_secs(poll_secs.max(1)),
            wait_budget: Duration::from_secs(budget_secs),
            limits: QuotaLimits {
                user_daily,
                group_daily,
            },
            refresh_cooldown: chrono::Duration::seconds(cooldown_secs),
            bot_gateway_url,
        }
    }

    /// Number of polls a waiter performs within its budget.
    pub fn max_polls(&self) -> u32 {
        max_polls(self.poll_interval, self.wait_budget)
    }
}

/// Whole intervals that fit in `budget`; `0` for a zero interval,
/// saturating at `u32::MAX`.
pub(crate) fn max_polls(interval: Duration, budget: Duration) -> u32 {
    budget
        .as_nanos()
        .checked_div(interval.as_nanos())
        .map_or(0, |polls| u32::try_from(polls).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_allows_twenty_polls() {
        assert_eq!(EngineConfig::default().max_polls(), 20);
    }

    #[test]
    fn partial_interval_is_not_polled() {
        assert_eq!(
            max_polls(Duration::from_secs(7), Duration::from_secs(20)),
            2
        );
        assert_eq!(max_polls(Duration::ZERO, Duration::from_secs(20)), 0);
    }

    #[test]
    fn sub_millisecond_interval_is_counted_in_nanos() {
        assert_eq!(
            max_polls(Duration::from_micros(500), Duration::from_millis(2)),
            4
        );
        assert_eq!(
            max_polls(Duration::from_nanos(1), Duration::from_secs(3600)),
            u32::MAX
        );
    }
}
