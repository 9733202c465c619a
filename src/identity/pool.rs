//! Proxy and user-agent pools
//!
//! The pools themselves never touch the network; `IdentityPool` drives the
//! refills through an `IdentitySource` whenever a pool runs dry.

use crate::identity::{Identity, IdentityError, IdentityResult, IdentitySource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Ordered queue of proxies with per-proxy usage counts
///
/// The front proxy is handed out until it has served `max_uses` requests,
/// then it is evicted and the next one moves up.
#[derive(Debug, Clone)]
pub struct ProxyQueue {
    entries: VecDeque<(String, u32)>,
    max_uses: u32,
}

impl ProxyQueue {
    /// Creates an empty queue with the given usage cap
    pub fn new(max_uses: u32) -> Self {
        Self {
            entries: VecDeque::new(),
            max_uses: max_uses.max(1),
        }
    }

    /// Replaces the queue contents with fresh, unused proxies
    pub fn refill(&mut self, proxies: impl IntoIterator<Item = String>) {
        self.entries = proxies.into_iter().map(|proxy| (proxy, 0)).collect();
    }

    /// Hands out the front proxy and records the use
    ///
    /// Returns `None` when the queue is empty.
    pub fn take(&mut self) -> Option<String> {
        let (proxy, uses) = self.entries.front_mut()?;
        *uses += 1;
        let proxy = proxy.clone();

        if *uses >= self.max_uses {
            self.entries.pop_front();
        }

        Some(proxy)
    }

    /// Usage count of a proxy still in the queue
    pub fn uses(&self, proxy: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(p, _)| p == proxy)
            .map(|(_, uses)| *uses)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Set of user agents that have not been handed out since the last refill
#[derive(Debug, Clone, Default)]
pub struct UserAgentSet {
    unused: Vec<String>,
}

impl UserAgentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the set contents
    pub fn refill(&mut self, user_agents: impl IntoIterator<Item = String>) {
        self.unused = user_agents.into_iter().collect();
    }

    /// Removes and returns a uniformly chosen user agent
    pub fn take<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        if self.unused.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.unused.len());
        Some(self.unused.swap_remove(index))
    }

    pub fn len(&self) -> usize {
        self.unused.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unused.is_empty()
    }
}

/// Rotating supply of identities backed by an `IdentitySource`
pub struct IdentityPool<S> {
    source: S,
    proxies: ProxyQueue,
    user_agents: UserAgentSet,
    max_user_agents: usize,
    rng: StdRng,
}

impl<S: IdentitySource> IdentityPool<S> {
    /// Creates an empty pool; the first draw triggers the refills
    ///
    /// # Arguments
    ///
    /// * `source` - Where fresh proxies and user agents come from
    /// * `max_proxy_uses` - Requests a proxy serves before eviction
    /// * `max_user_agents` - User agents taken per refill
    pub fn new(source: S, max_proxy_uses: u32, max_user_agents: usize) -> Self {
        Self {
            source,
            proxies: ProxyQueue::new(max_proxy_uses),
            user_agents: UserAgentSet::new(),
            max_user_agents,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replaces the random generator, for deterministic user-agent selection
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Returns the next proxy, refilling the queue first if it is empty
    pub async fn next_proxy(&mut self) -> IdentityResult<String> {
        if self.proxies.is_empty() {
            let proxies = self.source.fetch_proxies().await?;
            tracing::debug!("Refilled proxy pool with {} proxies", proxies.len());
            self.proxies.refill(proxies);
        }

        self.proxies
            .take()
            .ok_or_else(|| IdentityError::EmptySource {
                url: "proxy source".to_string(),
                what: "proxies",
            })
    }

    /// Returns an unused user agent, refilling the set first if it is empty
    pub async fn next_user_agent(&mut self) -> IdentityResult<String> {
        if self.user_agents.is_empty() {
            let user_agents = self.source.fetch_user_agents(self.max_user_agents).await?;
            tracing::debug!("Refilled user-agent pool with {} entries", user_agents.len());
            self.user_agents.refill(user_agents);
        }

        self.user_agents
            .take(&mut self.rng)
            .ok_or_else(|| IdentityError::EmptySource {
                url: "user-agent source".to_string(),
                what: "user agents",
            })
    }

    /// Draws a fresh (proxy, user agent) pair
    pub async fn next_identity(&mut self) -> IdentityResult<Identity> {
        let proxy = self.next_proxy().await?;
        let user_agent = self.next_user_agent().await?;
        Ok(Identity { proxy, user_agent })
    }

    /// Proxies left before the next refill
    pub fn proxies_remaining(&self) -> usize {
        self.proxies.len()
    }

    /// User agents left before the next refill
    pub fn user_agents_remaining(&self) -> usize {
        self.user_agents.len()
    }
}
