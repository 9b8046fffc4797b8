use crate::config::types::{Config, CrawlerConfig, GithubConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on parallel descriptor fetches within one page
pub const MAX_FETCH_CONCURRENCY: usize = 8;

/// Upper bound on rate-limit retries of a single request
pub const MAX_RATE_LIMIT_RETRIES: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_github_config(&config.github)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates endpoints and token settings
fn validate_github_config(config: &GithubConfig) -> Result<(), ConfigError> {
    for (field, value) in [
        ("api-endpoint", &config.api_endpoint),
        ("web-base", &config.web_base),
        ("raw-base", &config.raw_base),
    ] {
        let url = Url::parse(value)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "{} must use an http(s) scheme, got '{}'",
                field, value
            )));
        }
    }

    if config.token_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "token-env cannot be empty".to_string(),
        ));
    }

    if config.search_term.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search-term cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.fetch_concurrency < 1 || config.fetch_concurrency > MAX_FETCH_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "fetch-concurrency must be between 1 and {}, got {}",
            MAX_FETCH_CONCURRENCY, config.fetch_concurrency
        )));
    }

    if config.rate_limit_retries > MAX_RATE_LIMIT_RETRIES {
        return Err(ConfigError::Validation(format!(
            "rate-limit-retries must be <= {}, got {}",
            MAX_RATE_LIMIT_RETRIES, config.rate_limit_retries
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
