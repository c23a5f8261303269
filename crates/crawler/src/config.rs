/// Default user agents, rotated per request.
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0",
];

/// Scrape configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Official profile page; the nickname is sent as the `nick` query
    /// parameter.
    pub primary_url: String,
    /// Stats export base; the request path is `{base}/{nick}/export/json`.
    pub secondary_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agents: Vec<String>,
    /// Hosts (and their subdomains) the transport may contact.
    pub allowed_domains: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            primary_url: "https://warthunder.com/en/community/userinfo/".to_string(),
            secondary_url: "https://thunderskill.com/en/stat".to_string(),
            timeout_secs: 15,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            allowed_domains: vec!["warthunder.com".to_string(), "thunderskill.com".to_string()],
        }
    }
}

impl CrawlerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                                        |
    /// |--------------------------|------------------------------------------------|
    /// | `PRIMARY_SOURCE_URL`     | `https://warthunder.com/en/community/userinfo/` |
    /// | `SECONDARY_SOURCE_URL`   | `https://thunderskill.com/en/stat`             |
    /// | `SCRAPE_TIMEOUT_SECS`    | `15`                                           |
    /// | `SCRAPE_USER_AGENTS`     | built-in desktop browser list                  |
    /// | `SCRAPE_ALLOWED_DOMAINS` | `warthunder.com,thunderskill.com`              |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let primary_url = std::env::var("PRIMARY_SOURCE_URL").unwrap_or(defaults.primary_url);
        let secondary_url =
            std::env::var("SECONDARY_SOURCE_URL").unwrap_or(defaults.secondary_url);

        let timeout_secs: u64 = std::env::var("SCRAPE_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults.timeout_secs.to_string())
            .parse()
            .expect("SCRAPE_TIMEOUT_SECS must be a valid u64");

        let user_agents = std::env::var("SCRAPE_USER_AGENTS")
            .map(|v| split_list(&v))
            .ok()
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.user_agents);

        let allowed_domains = std::env::var("SCRAPE_ALLOWED_DOMAINS")
            .map(|v| split_list(&v))
            .ok()
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.allowed_domains);

        Self {
            primary_url,
            secondary_url,
            timeout_secs,
            user_agents,
            allowed_domains,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
