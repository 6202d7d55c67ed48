use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Largest accepted image size cap (1 GiB)
const MAX_IMAGE_SIZE_LIMIT_KB: u64 = 1024 * 1024;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 || config.request_timeout_secs > 600 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 600, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 || config.connect_timeout_secs > config.request_timeout_secs
    {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be between 1 and request_timeout_secs ({}), got {}",
            config.request_timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.image_probe_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "image_probe_timeout_secs must be >= 1, got {}",
            config.image_probe_timeout_secs
        )));
    }

    if config.image_size_limit_kb < 1 || config.image_size_limit_kb > MAX_IMAGE_SIZE_LIMIT_KB {
        return Err(ConfigError::Validation(format!(
            "image_size_limit_kb must be between 1 and {}, got {}",
            MAX_IMAGE_SIZE_LIMIT_KB, config.image_size_limit_kb
        )));
    }

    if config.max_alt_length < 1 {
        return Err(ConfigError::Validation(format!(
            "max_alt_length must be >= 1, got {}",
            config.max_alt_length
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "directory cannot be empty".to_string(),
        ));
    }

    if !config.delimiter.is_ascii() || matches!(config.delimiter, '"' | '\n' | '\r') {
        return Err(ConfigError::Validation(format!(
            "delimiter must be a single ASCII character other than a quote or newline, got {:?}",
            config.delimiter
        )));
    }

    if let Some(path) = &config.sqlite_path {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "sqlite_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}
