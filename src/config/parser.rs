use crate::config::types::{Config, GithubConfig};
use crate::config::validation::validate;
use crate::{ConfigError, CrawlError};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a run can be traced back to the exact settings it used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Reads the access token from the environment variable named in the config
///
/// A missing or blank token is a fatal precondition for crawling.
pub fn resolve_token(config: &GithubConfig) -> Result<String, CrawlError> {
    resolve_token_with(config, |name| std::env::var(name).ok())
}

fn resolve_token_with<F>(config: &GithubConfig, lookup: F) -> Result<String, CrawlError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(&config.token_env) {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(CrawlError::MissingToken(config.token_env.clone())),
    }
}
