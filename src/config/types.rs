use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Sumi-Swarm
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Initial keys for the frontier; the CLI may append more
    #[serde(default)]
    pub seeds: Vec<String>,

    #[serde(default)]
    pub workers: WorkerConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub session: SessionConfig,

    pub user_agent: UserAgentConfig,
}

/// Worker pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WorkerConfig {
    /// Number of concurrent workers
    pub count: usize,

    /// Upper bound on how long an idle worker waits before re-checking the
    /// frontier (milliseconds)
    pub idle_poll_ms: u64,

    /// Follow links discovered in fetched pages
    pub crawl: bool,

    /// Only follow links on the same host as the page they were found on
    pub same_host: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: 4,
            idle_poll_ms: 50,
            crawl: false,
            same_host: true,
        }
    }
}

/// What the transport client returns for each key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientMode {
    /// Page body as text
    #[default]
    Text,

    /// Raw body bytes
    Bytes,

    /// Raw body bytes of `image/*` responses only
    Image,
}

/// Client chain configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    pub mode: ClientMode,

    /// Attempts per key, including the first
    pub retry_count: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: ClientMode::Text,
            retry_count: 3,
        }
    }
}

/// How the cache decorator treats stored values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// No cache layer
    #[default]
    None,

    /// Serve from cache, fetch and store on miss
    Through,

    /// Serve from cache only, fail on miss
    Only,

    /// Fail on keys already cached, fetch and store the rest
    Skip,
}

/// Cache configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CacheConfig {
    pub policy: CachePolicy,

    /// Root folder of the file cache
    pub directory: Option<String>,
}

/// Session pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SessionConfig {
    /// Maximum number of open proxied sessions
    pub pool_size: usize,

    /// Proxy identifiers (`host:port` or full URLs); empty means one direct session
    pub proxies: Vec<String>,

    /// Total request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Default headers sent by every session
    pub headers: BTreeMap<String, String>,

    /// Cookies sent by the session bound to each proxy
    pub cookies: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            proxies: Vec::new(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl UserAgentConfig {
    /// The `User-Agent` header value, e.g.
    /// `SumiSwarm/0.1 (+https://example.com/about; ops@example.com)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}
