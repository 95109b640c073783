use crate::config::types::{
    ClassifierConfig, Config, CrawlerConfig, DelayRange, FetchConfig, IdentityEntry, LinkConfig,
    OutputConfig,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_seeds(&config.crawler.seeds)?;
    validate_fetch_config(&config.fetch)?;
    validate_identities(&config.identities)?;
    validate_classifier_config(&config.classifier)?;
    validate_link_config(&config.links)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl budgets and pool size
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.worker_count < 1 || config.worker_count > 64 {
        return Err(ConfigError::Validation(format!(
            "worker_count must be between 1 and 64, got {}",
            config.worker_count
        )));
    }

    if config.max_pages_visited < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_visited must be >= 1, got {}",
            config.max_pages_visited
        )));
    }

    if config.max_wall_clock_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "max_wall_clock_seconds must be >= 1, got {}",
            config.max_wall_clock_seconds
        )));
    }

    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_failures must be >= 1, got {}",
            config.max_consecutive_failures
        )));
    }

    if config.max_frontier_size == Some(0) {
        return Err(ConfigError::Validation(
            "max_frontier_size must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed set; an unusable seed set is fatal at startup
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                seed
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' has no host",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates retry policy and delay windows
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.request_timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_seconds must be >= 1, got {}",
            config.request_timeout_seconds
        )));
    }

    if config.retry_max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_max_attempts must be >= 1, got {}",
            config.retry_max_attempts
        )));
    }

    validate_range("inter_request_delay", &config.inter_request_delay)?;
    validate_range("transport_backoff", &config.transport_backoff)?;
    validate_range("block_backoff", &config.block_backoff)?;
    validate_range("rate_limit_backoff", &config.rate_limit_backoff)?;

    let block = &config.block_backoff;
    let limited = &config.rate_limit_backoff;
    let both_zero = *block == DelayRange::ZERO && *limited == DelayRange::ZERO;
    if !both_zero && (limited.min <= block.min || limited.max <= block.max) {
        return Err(ConfigError::Validation(format!(
            "rate_limit_backoff ({}..{}s) must be strictly larger than block_backoff ({}..{}s)",
            limited.min, limited.max, block.min, block.max
        )));
    }

    Ok(())
}

fn validate_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be finite and non-negative",
            name
        )));
    }

    if range.min > range.max {
        return Err(ConfigError::Validation(format!(
            "{} min ({}) must not exceed max ({})",
            name, range.min, range.max
        )));
    }

    Ok(())
}

fn validate_identities(identities: &[IdentityEntry]) -> Result<(), ConfigError> {
    for entry in identities {
        if entry.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "identity user_agent cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    if !(config.affirming_threshold > 0.0) {
        return Err(ConfigError::Validation(format!(
            "affirming_threshold must be > 0, got {}",
            config.affirming_threshold
        )));
    }

    if config.prose_window == 0 {
        return Err(ConfigError::Validation(
            "prose_window must be >= 1".to_string(),
        ));
    }

    if config.min_date_mentions == 0 {
        return Err(ConfigError::Validation(
            "min_date_mentions must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_link_config(config: &LinkConfig) -> Result<(), ConfigError> {
    if !config.content_prefix.starts_with('/') {
        return Err(ConfigError::InvalidPattern(format!(
            "content_prefix must start with '/', got '{}'",
            config.content_prefix
        )));
    }

    if let Some(patterns) = &config.url_denylist {
        for pattern in patterns {
            Regex::new(pattern).map_err(|e| {
                ConfigError::InvalidPattern(format!("url_denylist '{}': {}", pattern, e))
            })?;
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
