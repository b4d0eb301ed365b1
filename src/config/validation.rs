use crate::config::types::{
    CacheConfig, CachePolicy, ClientConfig, ClientMode, Config, SessionConfig, UserAgentConfig,
    WorkerConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_worker_config(&config.workers)?;
    validate_client_config(&config.client)?;
    validate_cache_config(&config.cache)?;
    validate_session_config(&config.session)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_seeds(&config.seeds)?;

    if config.workers.crawl && config.client.mode != ClientMode::Text {
        return Err(ConfigError::Validation(
            "crawl = true requires client mode \"text\"".to_string(),
        ));
    }

    Ok(())
}

/// Validates worker pool configuration
fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    if config.count < 1 || config.count > 256 {
        return Err(ConfigError::Validation(format!(
            "worker count must be between 1 and 256, got {}",
            config.count
        )));
    }

    if config.idle_poll_ms < 1 || config.idle_poll_ms > 10_000 {
        return Err(ConfigError::Validation(format!(
            "idle_poll_ms must be between 1 and 10000, got {}",
            config.idle_poll_ms
        )));
    }

    Ok(())
}

fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.retry_count < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_count must be >= 1, got {}",
            config.retry_count
        )));
    }
    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.policy == CachePolicy::None {
        return Ok(());
    }

    match config.directory.as_deref() {
        Some(directory) if !directory.is_empty() => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "cache directory is required for policy {:?}",
            config.policy
        ))),
    }
}

/// Validates session pool configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if !config.proxies.is_empty() && config.pool_size < 1 {
        return Err(ConfigError::Validation(
            "pool_size must be >= 1 when proxies are configured".to_string(),
        ));
    }

    if let Some(proxy) = config.proxies.iter().find(|p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "proxy identifiers cannot be empty, got '{}'",
            proxy
        )));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "session timeouts must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
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

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates seed URLs
///
/// Returns the seeds in normalized form, fragment dropped, so they compare
/// equal to links discovered while crawling.
pub(crate) fn validate_seeds(seeds: &[String]) -> Result<Vec<String>, ConfigError> {
    let mut normalized = Vec::with_capacity(seeds.len());

    for seed in seeds {
        let mut url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }

        url.set_fragment(None);
        normalized.push(url.to_string());
    }

    Ok(normalized)
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
