//! Fetch client with identity rotation
//!
//! # Request Flow
//!
//! 1. Draw a (proxy, user agent) identity from the pool
//! 2. Send GET through the transport
//! 3. Without retry: hand back whatever came back (any status)
//! 4. With retry: repeat until a 200 arrives, asking the `RetryPolicy` after
//!    every failed attempt whether to keep the identity, rotate it, or give up

use crate::config::Config;
use crate::fetch::{
    FetchError, FetchResult, FetchedPage, ReqwestTransport, RetryAction, RetryPolicy, Transport,
};
use crate::identity::{HttpIdentitySource, Identity, IdentityPool, IdentitySource};
use crate::HarvestError;
use std::time::Duration;
use tokio::sync::Mutex;

/// Fetches pages through rotating identities
pub struct FetchClient<S, T> {
    pool: Mutex<IdentityPool<S>>,
    transport: T,
    policy: RetryPolicy,
    retry_delay: Duration,
}

impl FetchClient<HttpIdentitySource, ReqwestTransport> {
    /// Builds the production client from configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let timeout = Duration::from_secs(config.fetch.timeout_secs);
        let source = HttpIdentitySource::new(&config.identity, timeout)?;
        let pool = IdentityPool::new(
            source,
            config.identity.max_proxy_uses,
            config.identity.max_user_agents,
        );
        let policy = RetryPolicy::from_limits(config.fetch.rotate_after, config.fetch.max_attempts);

        Ok(FetchClient::new(pool, ReqwestTransport::new(timeout), policy)
            .with_retry_delay(Duration::from_millis(config.fetch.retry_delay_ms)))
    }
}

impl<S: IdentitySource, T: Transport> FetchClient<S, T> {
    pub fn new(pool: IdentityPool<S>, transport: T, policy: RetryPolicy) -> Self {
        Self {
            pool: Mutex::new(pool),
            transport,
            policy,
            retry_delay: Duration::ZERO,
        }
    }

    /// Sets a pause between retry attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches `url`
    ///
    /// # Arguments
    ///
    /// * `url` - Page to fetch
    /// * `allow_retry` - Keep trying until the server answers 200
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - With retry, always a 200 page; without, the first response
    /// * `Err(FetchError::FetchFailed)` - Without retry, the single attempt failed at transport level
    /// * `Err(FetchError::RetryExhausted)` - A bounded policy ran out of attempts
    /// * `Err(FetchError::Identity)` - The identity pool could not be refilled
    pub async fn fetch(&self, url: &str, allow_retry: bool) -> FetchResult<FetchedPage> {
        let mut identity = self.next_identity().await?;

        if !allow_retry {
            return self
                .transport
                .send(url, &identity)
                .await
                .map_err(|source| FetchError::FetchFailed {
                    url: url.to_string(),
                    source,
                });
        }

        let mut failures: u32 = 0;
        loop {
            let last_status = match self.transport.send(url, &identity).await {
                Ok(page) if page.is_ok() => {
                    if failures > 0 {
                        tracing::debug!("Fetched {} after {} failed attempts", url, failures);
                    }
                    return Ok(page);
                }
                Ok(page) => {
                    tracing::warn!(
                        "Request failed: {} returned HTTP {} (proxy: {})",
                        url,
                        page.status,
                        identity.proxy
                    );
                    Some(page.status)
                }
                Err(e) => {
                    tracing::warn!(
                        "Request failed: {}: {} (proxy: {})",
                        url,
                        e,
                        identity.proxy
                    );
                    None
                }
            };

            failures += 1;

            match self.policy.decide(failures) {
                RetryAction::RetrySame => {
                    tracing::debug!("Retrying {} (attempt {})", url, failures + 1);
                }
                RetryAction::Rotate => {
                    tracing::info!(
                        "{} consecutive failures for {}, changing proxy and user agent",
                        failures,
                        url
                    );
                    identity = self.next_identity().await?;
                }
                RetryAction::GiveUp => {
                    return Err(FetchError::RetryExhausted {
                        url: url.to_string(),
                        attempts: failures,
                        last_status,
                    });
                }
            }

            if !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
    }

    async fn next_identity(&self) -> FetchResult<Identity> {
        let mut pool = self.pool.lock().await;
        Ok(pool.next_identity().await?)
    }
}
