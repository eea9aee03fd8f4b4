use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// Over the limit for the current window; `retry_after` is the time until
    /// the window resets.
    Denied { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

#[derive(Debug)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Sharded fixed-window rate limiter keyed by client identity.
///
/// Multiple shards (separate HashMaps) keep distinct clients off the same
/// lock under concurrent upload bursts. A window admits up to `max_requests`
/// and then denies until it expires; the first request after expiry starts a
/// fresh window.
#[derive(Clone)]
pub struct RateLimiter {
    shards: Vec<Arc<Mutex<HashMap<String, Window>>>>,
    shard_count: usize,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_shards(max_requests, window, 16)
    }

    pub fn with_shards(max_requests: u32, window: Duration, shard_count: usize) -> Self {
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            shard_count,
            max_requests,
            window,
        }
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shard_count
    }

    fn lock_shard(&self, key: &str) -> std::sync::MutexGuard<'_, HashMap<String, Window>> {
        let shard = &self.shards[self.shard_index(key)];
        match shard.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Check and record one request for `key` at `now`.
    pub fn admit(&self, key: &str, now: Instant) -> Admission {
        let mut windows = self.lock_shard(key);
        match windows.get_mut(key) {
            Some(window) if now.duration_since(window.started_at) < self.window => {
                if window.count < self.max_requests {
                    window.count += 1;
                    Admission::Allowed
                } else {
                    let retry_after = self.window - now.duration_since(window.started_at);
                    tracing::debug!(
                        key,
                        count = window.count,
                        retry_after_ms = retry_after.as_millis(),
                        "Rate limit exceeded"
                    );
                    Admission::Denied { retry_after }
                }
            }
            _ => {
                windows.insert(
                    key.to_string(),
                    Window {
                        started_at: now,
                        count: 1,
                    },
                );
                Admission::Allowed
            }
        }
    }

    /// Drop every window that expired before `now`. Returns how many entries
    /// were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut windows = match shard.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let before = windows.len();
            windows.retain(|_, w| now.duration_since(w.started_at) < self.window);
            removed += before - windows.len();
        }
        removed
    }

    /// Spawn the periodic sweeper that evicts stale windows until `shutdown`
    /// fires.
    pub fn spawn_sweeper(
        &self,
        sweep_interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Rate limiter sweeper shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = limiter.sweep(Instant::now());
                        if removed > 0 {
                            tracing::debug!(removed, "Swept expired rate limit windows");
                        }
                    }
                }
            }
        })
    }
}
