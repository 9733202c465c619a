//! HTTP transport
//!
//! This module handles the wire side of a fetch:
//! - Building HTTP clients bound to an identity (proxy + user agent)
//! - Sending GET requests with a fixed timeout
//! - Classifying transport errors

use crate::fetch::FetchedPage;
use crate::identity::Identity;
use reqwest::{Client, Proxy};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure (no HTTP response was received)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Invalid proxy {proxy}: {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Sends a single GET request on behalf of an identity
pub trait Transport {
    fn send(
        &self,
        url: &str,
        identity: &Identity,
    ) -> impl Future<Output = Result<FetchedPage, TransportError>> + Send;
}

/// reqwest-backed transport routing every request through the identity's proxy
///
/// The client for the current identity is cached, so a run of requests with
/// the same identity reuses one connection pool.
pub struct ReqwestTransport {
    timeout: Duration,
    cached: Mutex<Option<(Identity, Client)>>,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cached: Mutex::new(None),
        }
    }

    /// Returns the client for `identity`, building it when the identity changed
    fn client_for(&self, identity: &Identity) -> Result<Client, TransportError> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| TransportError::Other("client cache poisoned".to_string()))?;

        if let Some((current, client)) = cached.as_ref() {
            if current == identity {
                return Ok(client.clone());
            }
        }

        let client = build_http_client(identity, self.timeout)?;
        *cached = Some((identity.clone(), client.clone()));
        Ok(client)
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, url: &str, identity: &Identity) -> Result<FetchedPage, TransportError> {
        let client = self.client_for(identity)?;

        let response = client.get(url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }
}

/// Builds an HTTP client bound to one identity
///
/// # Arguments
///
/// * `identity` - Proxy and user agent to use for every request
/// * `timeout` - Whole-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(TransportError)` - The proxy URL was rejected or the client could not be built
pub fn build_http_client(identity: &Identity, timeout: Duration) -> Result<Client, TransportError> {
    let proxy = Proxy::all(&identity.proxy).map_err(|e| TransportError::InvalidProxy {
        proxy: identity.proxy.clone(),
        reason: e.to_string(),
    })?;

    Client::builder()
        .proxy(proxy)
        .user_agent(identity.user_agent.as_str())
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(TransportError::from)
}
