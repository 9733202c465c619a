//! Fetch layer for catalog pages
//!
//! This module contains:
//! - The `Transport` seam and its reqwest implementation (proxy + user agent per identity)
//! - A pure `RetryPolicy` deciding between retrying, rotating and giving up
//! - The `FetchClient` that combines the identity pool, transport and policy

mod client;
mod retry;
mod transport;

pub use client::FetchClient;
pub use retry::{RetryAction, RetryPolicy};
pub use transport::{ReqwestTransport, Transport, TransportError};

use crate::identity::IdentityError;
use thiserror::Error;

/// A fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

impl FetchedPage {
    /// Returns true for a 200 response
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Errors returned by `FetchClient::fetch`
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Fetch of {url} failed: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Gave up on {url} after {attempts} attempts (last status: {last_status:?})")]
    RetryExhausted {
        url: String,
        attempts: u32,
        last_status: Option<u16>,
    },

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;
