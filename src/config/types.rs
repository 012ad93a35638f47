use serde::Deserialize;

/// Main configuration structure for Articlesa
///
/// Every section is optional in the TOML file; missing sections take their
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub blacklist: BlacklistConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Depth used when a crawl request does not give one
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Per-fetch timeout (milliseconds)
    #[serde(rename = "fetch-timeout-ms")]
    pub fetch_timeout_ms: u64,

    /// Maximum number of fetches running at once
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Maximum number of simultaneous redirect (HEAD) probes
    #[serde(rename = "max-redirect-probes")]
    pub max_redirect_probes: u32,

    /// Maximum redirect hops followed by a single request
    #[serde(rename = "max-redirects")]
    pub max_redirects: u32,

    /// Capacity of the event channel to the client
    #[serde(rename = "event-buffer")]
    pub event_buffer: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            fetch_timeout_ms: 30_000,
            max_concurrent_fetches: 16,
            max_redirect_probes: 25,
            max_redirects: 10,
            event_buffer: 64,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "articlesa".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/articlesa/articlesa".to_string(),
            contact_email: "articlesa@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Article store configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file; no store is used when absent
    #[serde(rename = "database-path")]
    pub database_path: Option<String>,
}

/// Host blacklist sources
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    /// File with one host per line
    pub file: Option<String>,

    /// Inline host entries
    pub hosts: Vec<String>,
}
