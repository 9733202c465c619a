use crate::config::types::{CatalogConfig, Config, FetchConfig, HarvestConfig, IdentityConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_identity_config(&config.identity)?;
    validate_fetch_config(&config.fetch)?;
    validate_harvest_config(&config.harvest)?;

    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the catalog locations
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    validate_http_url("index_url", &config.index_url)?;

    if !config.detail_url.contains("{name}") {
        return Err(ConfigError::Validation(format!(
            "detail_url must contain the {{name}} placeholder, got '{}'",
            config.detail_url
        )));
    }
    validate_http_url("detail_url", &config.detail_url_for("placeholder"))?;

    Ok(())
}

/// Validates identity sources and pool limits
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    validate_http_url("proxy_source", &config.proxy_source)?;
    validate_http_url("user_agent_source", &config.user_agent_source)?;

    if Selector::parse(&config.user_agent_selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "user_agent_selector is not a valid CSS selector: '{}'",
            config.user_agent_selector
        )));
    }

    if config.max_proxy_uses < 1 {
        return Err(ConfigError::Validation(
            "max_proxy_uses must be >= 1".to_string(),
        ));
    }

    if config.max_user_agents < 1 {
        return Err(ConfigError::Validation(
            "max_user_agents must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch timing and retry limits
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.rotate_after < 1 {
        return Err(ConfigError::Validation(
            "rotate_after must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "progress_interval must be >= 1".to_string(),
        ));
    }
    Ok(())
}

/// Checks that a URL parses and uses an HTTP(S) scheme
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::OutputConfig;

    fn valid_config() -> Config {
        Config {
            catalog: CatalogConfig {
                index_url: "https://catalog.example.com/index.html".to_string(),
                detail_url: "https://catalog.example.com/package={name}".to_string(),
            },
            identity: IdentityConfig {
                proxy_source: "https://proxies.example.com/list".to_string(),
                user_agent_source: "https://agents.example.com/all".to_string(),
                user_agent_selector: "#liste li".to_string(),
                max_proxy_uses: 5,
                max_user_agents: 30,
            },
            fetch: FetchConfig::default(),
            output: OutputConfig {
                database_path: "./catalog.db".to_string(),
            },
            harvest: HarvestConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_detail_url_requires_placeholder() {
        let mut config = valid_config();
        config.catalog.detail_url = "https://catalog.example.com/package".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_non_http_urls() {
        let mut config = valid_config();
        config.identity.proxy_source = "ftp://proxies.example.com/list".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        let mut config = valid_config();
        config.catalog.index_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_zero_limits() {
        let mut config = valid_config();
        config.identity.max_proxy_uses = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.identity.max_user_agents = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.fetch.rotate_after = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.fetch.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_selector() {
        let mut config = valid_config();
        config.identity.user_agent_selector = "li[[".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_empty_database_path() {
        let mut config = valid_config();
        config.output.database_path = String::new();
        assert!(validate(&config).is_err());
    }
}
