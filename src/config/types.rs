use serde::Deserialize;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
}

/// Target catalog locations
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// URL of the page listing every catalog entry
    #[serde(rename = "index-url")]
    pub index_url: String,

    /// Detail page URL template; `{name}` is replaced by the entry name
    #[serde(rename = "detail-url")]
    pub detail_url: String,
}

impl CatalogConfig {
    /// Builds the detail page URL for an entry
    pub fn detail_url_for(&self, name: &str) -> String {
        self.detail_url.replace("{name}", name)
    }
}

/// Egress identity sources and pool limits
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Plain-text proxy list, one `host:port` per line
    #[serde(rename = "proxy-source")]
    pub proxy_source: String,

    /// HTML page listing user-agent strings
    #[serde(rename = "user-agent-source")]
    pub user_agent_source: String,

    /// CSS selector for the user-agent list items
    #[serde(rename = "user-agent-selector", default = "default_user_agent_selector")]
    pub user_agent_selector: String,

    /// Number of requests a proxy serves before it is evicted
    #[serde(rename = "max-proxy-uses", default = "default_max_proxy_uses")]
    pub max_proxy_uses: u32,

    /// Number of user agents taken per refill
    #[serde(rename = "max-user-agents", default = "default_max_user_agents")]
    pub max_user_agents: usize,
}

/// Fetch and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Consecutive failures after which a new identity is drawn
    #[serde(rename = "rotate-after", default = "default_rotate_after")]
    pub rotate_after: u32,

    /// Attempt cap for retrying fetches (0 retries forever)
    #[serde(rename = "max-attempts", default)]
    pub max_attempts: u32,

    /// Pause between retry attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default)]
    pub retry_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            rotate_after: default_rotate_after(),
            max_attempts: 0,
            retry_delay_ms: 0,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Harvest loop behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Maximum number of index entries to process (0 processes all)
    #[serde(default)]
    pub limit: usize,

    /// Log progress every N entries
    #[serde(rename = "progress-interval", default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Halt the run when an entry cannot be stored
    #[serde(rename = "stop-on-storage-error", default = "default_true")]
    pub stop_on_storage_error: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            limit: 0,
            progress_interval: default_progress_interval(),
            stop_on_storage_error: true,
        }
    }
}

fn default_user_agent_selector() -> String {
    "#liste li".to_string()
}

fn default_max_proxy_uses() -> u32 {
    5
}

fn default_max_user_agents() -> usize {
    30
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_rotate_after() -> u32 {
    5
}

fn default_progress_interval() -> usize {
    25
}

fn default_true() -> bool {
    true
}
