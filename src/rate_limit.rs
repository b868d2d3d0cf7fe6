//! Per-client throttling of the subscribe endpoint.
//!
//! The guard only sees the `RateLimitStore` capability, so the in-process sliding window below
//! can be swapped for a shared external counter without touching the pipeline.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::http::HeaderMap;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

pub const REAL_IP_HEADER: &str = "x-real-ip";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
pub const UNKNOWN_CLIENT: &str = "unknown";

// ###################################
// ->   CLIENT ID
// ###################################
/// Coarse client identity used for throttling. Not unique: every client behind the same proxy
/// (or without any proxy header) shares one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Prefers the proxy-set `x-real-ip` over the client-forwardable `x-forwarded-for` list,
    /// falling back to `"unknown"`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let id = header_str(REAL_IP_HEADER)
            .or_else(|| {
                header_str(FORWARDED_FOR_HEADER)
                    .and_then(|list| list.split(',').next())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
            })
            .unwrap_or(UNKNOWN_CLIENT);

        ClientId(id.to_string())
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ###################################
// ->   STORE
// ###################################
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: usize,
}

/// Check-and-increment capability. Implementations only need to be approximately atomic per
/// identifier: a burst may slip one extra request through, but must not undercount wildly.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn check_and_increment(&self, client: &ClientId) -> RateLimitDecision;
}

/// In-process sliding window. State is lost on restart.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    max_requests: usize,
    window: Duration,
    entries: DashMap<ClientId, VecDeque<Instant>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: DashMap::new(),
        }
    }

    /// Drops identifiers with no requests left inside the window.
    pub fn purge_stale(&self) {
        let now = Instant::now();
        let window = self.window;
        self.entries.retain(|_, stamps| {
            stamps
                .back()
                .is_some_and(|last| now.duration_since(*last) < window)
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }

    /// Spawns a background task purging stale identifiers once per window.
    pub fn spawn_purge_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.window);
            loop {
                interval.tick().await;
                limiter.purge_stale();
                debug!(
                    "{:<12} - tracked clients: {}",
                    "RATE_LIMIT",
                    limiter.tracked_clients()
                );
            }
        })
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimiter {
    async fn check_and_increment(&self, client: &ClientId) -> RateLimitDecision {
        let now = Instant::now();
        // The entry guard holds the shard lock, so check and push happen as one step per key.
        let mut stamps = self.entries.entry(client.clone()).or_default();
        while stamps
            .front()
            .is_some_and(|first| now.duration_since(*first) >= self.window)
        {
            stamps.pop_front();
        }

        if stamps.len() >= self.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
            };
        }

        stamps.push_back(now);
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - stamps.len(),
        }
    }
}
