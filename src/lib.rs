//! Odds Crawler: esports betting-odds collection
//!
//! This crate walks a bookmaker's esports listing page, visits every match
//! page it links to in small concurrent batches, and stores each match with
//! its betting markets. Every bookmaker is handled by a site adapter that knows
//! the site's page layout and how it writes kickoff dates.

pub mod adapters;
pub mod config;
pub mod crawler;
pub mod date;
pub mod model;
pub mod output;
pub mod render;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The listing page could not be read; nothing can be crawled
    #[error("Failed to read listing {url}: {source}")]
    Listing { url: String, source: ExtractError },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failures of a single adapter invocation
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Timed out rendering {url} while waiting for {waiting_for}")]
    RenderTimeout { url: String, waiting_for: String },

    #[error("Failed to render {url}: {message}")]
    Render { url: String, message: String },

    #[error("Unexpected page layout at {url}: {detail}")]
    LayoutMismatch { url: String, detail: String },

    #[error("Incomplete match data at {url}: {detail}")]
    SchemaMismatch { url: String, detail: String },

    #[error("Unreadable kickoff time at {url}: {source}")]
    DateParse {
        url: String,
        source: date::DateParseError,
    },

    #[error("Failed to store data from {url}: {source}")]
    Persistence {
        url: String,
        source: storage::StorageError,
    },
}

impl ExtractError {
    /// The extraction stage this failure happened in
    pub fn stage(&self) -> ExtractionState {
        match self {
            Self::RenderTimeout { .. } | Self::Render { .. } => ExtractionState::Rendering,
            Self::LayoutMismatch { .. } | Self::SchemaMismatch { .. } | Self::DateParse { .. } => {
                ExtractionState::Extracting
            }
            Self::Persistence { .. } => ExtractionState::Persisting,
        }
    }

    /// The page the failure relates to
    pub fn url(&self) -> &str {
        match self {
            Self::RenderTimeout { url, .. }
            | Self::Render { url, .. }
            | Self::LayoutMismatch { url, .. }
            | Self::SchemaMismatch { url, .. }
            | Self::DateParse { url, .. }
            | Self::Persistence { url, .. } => url,
        }
    }

    /// Wraps a rendering failure of `page`
    ///
    /// Render errors that carry no URL of their own are attributed to `page`.
    pub fn rendering(page: &str, err: render::RenderError) -> Self {
        use render::RenderError;

        match err {
            RenderError::Timeout {
                url, waiting_for, ..
            } => Self::RenderTimeout { url, waiting_for },
            RenderError::Navigation { url, message } => Self::Render { url, message },
            RenderError::MissingElement { url, selector } => Self::Render {
                url,
                message: format!("no element matches `{}`", selector),
            },
            other => Self::Render {
                url: page.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use adapters::{Site, SiteAdapter};
pub use config::Config;
pub use model::{Bet, BetOption, Match};
pub use state::ExtractionState;
