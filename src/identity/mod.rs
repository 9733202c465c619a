//! Egress identity management
//!
//! An identity is the (proxy, user-agent) pair used for outbound requests.
//! This module contains:
//! - Bounded proxy and user-agent pools with take-and-update operations
//! - The `IdentityPool` that refills those pools lazily from a source
//! - An HTTP-backed `IdentitySource` for public proxy and user-agent lists

mod pool;
mod source;

pub use pool::{IdentityPool, ProxyQueue, UserAgentSet};
pub use source::{parse_proxy_list, parse_user_agents, HttpIdentitySource};

use std::future::Future;
use thiserror::Error;

/// Errors raised while refilling identity pools
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity source unavailable ({url}): {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("Identity source {url} returned no {what}")]
    EmptySource { url: String, what: &'static str },
}

/// Result type for identity operations
pub type IdentityResult<T> = Result<T, IdentityError>;

/// The proxy and user agent used for one or more requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Proxy URL (e.g. `http://10.0.0.1:8080`)
    pub proxy: String,

    /// User-Agent header value
    pub user_agent: String,
}

/// Supplier of fresh proxies and user agents
///
/// Implementations perform network calls; failures are reported to the
/// caller and never retried here.
pub trait IdentitySource {
    /// Fetches the current proxy list as proxy URLs
    fn fetch_proxies(&self) -> impl Future<Output = IdentityResult<Vec<String>>> + Send;

    /// Fetches at most `max` user-agent strings
    fn fetch_user_agents(
        &self,
        max: usize,
    ) -> impl Future<Output = IdentityResult<Vec<String>>> + Send;
}
