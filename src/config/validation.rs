use crate::config::types::{Config, CrawlerConfig, DatabaseConfig, RendererConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_renderer_config(&config.renderer)?;
    validate_database_config(&config.database)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 32 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and 32, got {}",
            config.batch_size
        )));
    }

    if config.render_timeout_secs < 1 || config.render_timeout_secs > 600 {
        return Err(ConfigError::Validation(format!(
            "render-timeout-secs must be between 1 and 600, got {}",
            config.render_timeout_secs
        )));
    }

    let listing = config.listing_url()?;
    validate_http_url("listing-url", &listing)?;

    let base = config.base_url()?;
    validate_http_url("base-url", base.as_str())?;

    Ok(())
}

/// Validates rendering backend configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.poll_interval_ms < 50 {
        return Err(ConfigError::Validation(format!(
            "poll-interval-ms must be >= 50ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    Ok(())
}

/// Validates database configuration
fn validate_database_config(config: &DatabaseConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a URL parses and uses an HTTP(S) scheme
fn validate_http_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, raw, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("{} '{}' has no host", field, raw)));
    }

    Ok(())
}
