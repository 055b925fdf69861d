use crate::adapters::Site;
use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for the odds crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    pub database: DatabaseConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Bookmaker to crawl
    pub site: Site,

    /// Listing page to start from; falls back to the site's known listing
    #[serde(rename = "listing-url", default)]
    pub listing_url: Option<String>,

    /// Origin used to resolve relative match links; falls back to the site's origin
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    /// Number of match pages extracted concurrently per batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound for every single render call (seconds)
    #[serde(rename = "render-timeout-secs", default = "default_render_timeout")]
    pub render_timeout_secs: u64,
}

impl CrawlerConfig {
    /// Resolves the listing URL to crawl
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The configured listing, or the site's known listing
    /// * `Err(ConfigError)` - Neither is available for this site
    pub fn listing_url(&self) -> Result<String, ConfigError> {
        match &self.listing_url {
            Some(url) => Ok(url.clone()),
            None => self.site.default_listing_url().map(str::to_string).ok_or_else(|| {
                ConfigError::Validation(format!(
                    "listing-url is required for site '{}'",
                    self.site
                ))
            }),
        }
    }

    /// Resolves the base URL relative match links are joined onto
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.site.default_base_url());

        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", raw, e)))
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

/// Rendering backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    /// User agent sent with every page request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Delay between readiness polls (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

fn default_batch_size() -> usize {
    3
}

fn default_render_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (X11; Linux x86_64) odds-crawler/{}",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    500
}
