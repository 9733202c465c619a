//! HTTP-backed identity source
//!
//! Proxies come from a plain-text list (one `host:port` per line) and user
//! agents from an HTML page listing them as `<li>` items.

use crate::config::IdentityConfig;
use crate::identity::{IdentityError, IdentityResult, IdentitySource};
use crate::{ConfigError, HarvestError};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

/// Fetches proxy and user-agent lists over a direct (unproxied) connection
pub struct HttpIdentitySource {
    client: Client,
    proxy_source: String,
    user_agent_source: String,
    user_agent_selector: Selector,
}

impl HttpIdentitySource {
    /// Creates a source from the identity configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Source URLs and the user-agent list selector
    /// * `timeout` - Timeout applied to each list download
    pub fn new(config: &IdentityConfig, timeout: Duration) -> Result<Self, HarvestError> {
        let user_agent_selector = Selector::parse(&config.user_agent_selector).map_err(|e| {
            ConfigError::Validation(format!(
                "Invalid user_agent_selector '{}': {:?}",
                config.user_agent_selector, e
            ))
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            proxy_source: config.proxy_source.clone(),
            user_agent_source: config.user_agent_source.clone(),
            user_agent_selector,
        })
    }

    /// Downloads a source document as text
    async fn download(&self, url: &str) -> IdentityResult<String> {
        let unavailable = |reason: String| IdentityError::SourceUnavailable {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {}", status.as_u16())));
        }

        response.text().await.map_err(|e| unavailable(e.to_string()))
    }
}

impl IdentitySource for HttpIdentitySource {
    async fn fetch_proxies(&self) -> IdentityResult<Vec<String>> {
        let body = self.download(&self.proxy_source).await?;
        let proxies = parse_proxy_list(&body);
        tracing::info!("Fetched {} proxies from {}", proxies.len(), self.proxy_source);
        Ok(proxies)
    }

    async fn fetch_user_agents(&self, max: usize) -> IdentityResult<Vec<String>> {
        let body = self.download(&self.user_agent_source).await?;
        let user_agents = parse_user_agents(&body, &self.user_agent_selector, max);
        tracing::info!(
            "Fetched {} user agents from {}",
            user_agents.len(),
            self.user_agent_source
        );
        Ok(user_agents)
    }
}

/// Parses a plain-text proxy list into proxy URLs
///
/// Blank lines are ignored; `host:port` lines become `http://host:port`,
/// lines that already carry a scheme are kept as they are.
pub fn parse_proxy_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.contains("://") {
                line.to_string()
            } else {
                format!("http://{}", line)
            }
        })
        .collect()
}

/// Extracts up to `max` user-agent strings in document order
pub fn parse_user_agents(html: &str, selector: &Selector, max: usize) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(selector)
        .map(|item| item.text().collect::<String>().trim().to_string())
        .filter(|ua| !ua.is_empty())
        .take(max)
        .collect()
}
