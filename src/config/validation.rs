use crate::config::types::{Config, CrawlerConfig, FeedConfig, HttpConfig, StateConfig};
use crate::{ConfigError, ConfigResult};
use encoding_rs::Encoding;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_feed("main", &config.feeds.main)?;
    validate_feed("abyss-best", &config.feeds.abyss_best)?;
    validate_state_config(&config.state)?;

    if config.feeds.main.output_dir == config.feeds.abyss_best.output_dir {
        return Err(ConfigError::Validation(format!(
            "feeds must write to distinct output directories, both use '{}'",
            config.feeds.main.output_dir
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.write_concurrency < 1 || config.write_concurrency > 500 {
        return Err(ConfigError::Validation(format!(
            "write_concurrency must be between 1 and 500, got {}",
            config.write_concurrency
        )));
    }

    if config.lookback_months < 1 {
        return Err(ConfigError::Validation(
            "lookback_months must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> ConfigResult<()> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be greater than zero".to_string(),
        ));
    }

    if Encoding::for_label(config.charset.as_bytes()).is_none() {
        return Err(ConfigError::UnknownCharset(config.charset.clone()));
    }

    Ok(())
}

/// Validates a single feed entry
fn validate_feed(name: &str, feed: &FeedConfig) -> ConfigResult<()> {
    let url = Url::parse(&feed.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{} base-url '{}': {}", name, feed.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} base-url '{}' must use http or https",
            name, feed.base_url
        )));
    }

    if feed.output_dir.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} output-dir cannot be empty",
            name
        )));
    }

    Ok(())
}

/// Validates state file configuration
fn validate_state_config(config: &StateConfig) -> ConfigResult<()> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "state path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
