use crate::state::IdOrdering;
use serde::Deserialize;

/// Main configuration structure for the archiver
///
/// Every section is optional; a missing file section falls back to the
/// defaults for the public quote site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub feeds: FeedsConfig,
    pub state: StateConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of quote files written concurrently per feed
    #[serde(rename = "write-concurrency")]
    pub write_concurrency: usize,

    /// How far back (in months) the abyss-best feed is walked
    #[serde(rename = "lookback-months")]
    pub lookback_months: u32,

    /// How quote ids are compared against stored cursors
    #[serde(rename = "id-ordering")]
    pub id_ordering: IdOrdering,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            write_concurrency: 50,
            lookback_months: 12,
            id_ordering: IdOrdering::default(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Charset label used when a response does not declare one
    pub charset: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("quote-archiver/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            charset: "windows-1251".to_string(),
        }
    }
}

/// Per-feed endpoints and destinations
///
/// Each feed table may set any subset of its keys; the rest fall back to that
/// feed's own default.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawFeedsConfig")]
pub struct FeedsConfig {
    pub main: FeedConfig,
    pub abyss_best: FeedConfig,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            main: FeedConfig {
                base_url: "http://bash.im/index".to_string(),
                output_dir: "./main".to_string(),
            },
            abyss_best: FeedConfig {
                base_url: "http://bash.im/abyssbest".to_string(),
                output_dir: "./abyssbest".to_string(),
            },
        }
    }
}

/// A single feed
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Listing URL; page references are appended as a path segment
    pub base_url: String,

    /// Existing directory that receives one file per quote
    pub output_dir: String,
}

/// `[feeds]` as written in the file, before per-feed defaults are applied
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFeedsConfig {
    main: RawFeedConfig,

    #[serde(rename = "abyss-best")]
    abyss_best: RawFeedConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFeedConfig {
    #[serde(rename = "base-url")]
    base_url: Option<String>,

    #[serde(rename = "output-dir")]
    output_dir: Option<String>,
}

impl RawFeedConfig {
    fn resolve(self, defaults: FeedConfig) -> FeedConfig {
        FeedConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
        }
    }
}

impl From<RawFeedsConfig> for FeedsConfig {
    fn from(raw: RawFeedsConfig) -> Self {
        let defaults = FeedsConfig::default();
        Self {
            main: raw.main.resolve(defaults.main),
            abyss_best: raw.abyss_best.resolve(defaults.abyss_best),
        }
    }
}

/// State file configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Path to the JSON cursor file
    pub path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: "./cache.json".to_string(),
        }
    }
}
