//! Configuration module for the odds crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use odds_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("odds.toml")).unwrap();
//! println!("Crawling {} in batches of {}", config.crawler.site, config.crawler.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, DatabaseConfig, RendererConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

// Re-exported for re-checking a config after command-line overrides
pub use validation::validate;
