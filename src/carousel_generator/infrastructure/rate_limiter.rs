use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

pub const DEFAULT_RATE_LIMIT: u32 = 10;
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);
/// Idle buckets are swept once every this many calls.
const PRUNE_EVERY: u64 = 256;

/// Sliding-window request counter keyed by client identity.
///
/// The identity comes from a forwarded-IP header, which clients can spoof. This is an abuse
/// deterrent, not an access control.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
    calls: Arc<AtomicU64>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a request for `client` and reports whether it is within the limit. Rejected
    /// requests are not recorded.
    pub fn allow(&self, client: &str) -> bool {
        self.allow_at(client, Instant::now())
    }

    fn allow_at(&self, client: &str, now: Instant) -> bool {
        let window = self.window;
        let allowed = {
            let mut entry = self.buckets.entry(client.to_string()).or_default();
            entry.retain(|instant| now.duration_since(*instant) < window);
            if entry.len() as u32 >= self.max_requests {
                false
            } else {
                entry.push(now);
                true
            }
        };

        // entry のロックを手放してから掃除する
        if self.calls.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune_at(now);
        }
        allowed
    }

    /// Drops clients with no request inside the window.
    fn prune_at(&self, now: Instant) {
        let window = self.window;
        let before = self.buckets.len();
        self.buckets
            .retain(|_, log| log.last().is_some_and(|last| now.duration_since(*last) < window));
        debug!(before, after = self.buckets.len(), "pruned idle rate-limit buckets");
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_WINDOW, DEFAULT_RATE_LIMIT)
    }
}
