use crate::config::types::{Config, CrawlerConfig, EndpointLimit, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_endpoint_limit("listing", &config.rate_limit.listing)?;
    validate_endpoint_limit("detail", &config.rate_limit.detail)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    validate_groups(&config.groups)?;

    if config.workers < 1 || config.workers > 32 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 32, got {}",
            config.workers
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(
            "page_size must be >= 1".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 20 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 20, got {}",
            config.max_attempts
        )));
    }

    if config.max_backoff_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "max_backoff_ms ({}) must be >= backoff_base_ms ({})",
            config.max_backoff_ms, config.backoff_base_ms
        )));
    }

    Ok(())
}

/// Validates the competitive group list: non-empty, no blanks, no repeats
fn validate_groups(groups: &[String]) -> Result<(), ConfigError> {
    if groups.is_empty() {
        return Err(ConfigError::Validation(
            "at least one group must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for group in groups {
        if group.trim().is_empty() {
            return Err(ConfigError::Validation(
                "group names cannot be blank".to_string(),
            ));
        }

        if !seen.insert(group.as_str()) {
            return Err(ConfigError::Validation(format!(
                "group '{}' is listed more than once",
                group
            )));
        }
    }

    Ok(())
}

fn validate_endpoint_limit(name: &str, limit: &EndpointLimit) -> Result<(), ConfigError> {
    if limit.calls < 1 {
        return Err(ConfigError::Validation(format!(
            "rate-limit.{}.calls must be >= 1",
            name
        )));
    }

    if limit.period_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "rate-limit.{}.period-ms must be >= 1",
            name
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent name cannot be empty".to_string(),
        ));
    }

    if !config
        .name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "user-agent name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.name
        )));
    }

    if config.version.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.archive_dir.is_empty() {
        return Err(ConfigError::Validation(
            "archive_dir cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn base_config() -> Config {
        parse_config(
            r#"
[crawler]
groups = ["Chaos", "Materia"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_groups() {
        assert!(validate_groups(&["Chaos".to_string()]).is_ok());

        assert!(validate_groups(&[]).is_err());
        assert!(validate_groups(&["  ".to_string()]).is_err());
        assert!(validate_groups(&["Chaos".to_string(), "Chaos".to_string()]).is_err());
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = base_config();
        config.crawler.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.crawler.base_url = "ftp://eu.finalfantasyxiv.com".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.crawler.base_url = "http://127.0.0.1:8080".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_limits() {
        let mut config = base_config();
        config.rate_limit.detail.calls = 0;
        assert!(validate(&config).is_err());

        let mut config = base_config();
        config.crawler.max_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = base_config();
        config.crawler.max_backoff_ms = 10;
        config.crawler.backoff_base_ms = 100;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_user_agent_name() {
        let mut config = base_config();
        config.user_agent.name = "cc harvest".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.name = "cc_harvest-2".to_string();
        assert!(validate(&config).is_ok());
    }
}
