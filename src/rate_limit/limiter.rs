//! Fixed-window rate limiter.

use std::sync::Arc;

use serde::Serialize;

use crate::config::RoutePolicy;
use crate::identity::ClientKey;
use crate::observability::metrics;
use crate::rate_limit::clock::{Clock, SystemClock};
use crate::rate_limit::store::{MemoryWindowStore, WindowStore};

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub admitted: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix milliseconds at which the current window ends.
    pub reset_at: u64,
    /// Set only on rejection.
    pub retry_after_secs: Option<u64>,
}

impl Decision {
    /// Window end in unix seconds, rounded up.
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at.div_ceil(1000)
    }
}

/// Counts requests per `scope:client` in fixed windows.
///
/// A client can get up to twice the limit through across a window
/// boundary (end of one window plus start of the next).
#[derive(Clone)]
pub struct WindowRateLimiter {
    store: Arc<dyn WindowStore>,
    clock: Arc<dyn Clock>,
}

impl WindowRateLimiter {
    pub fn new(store: Arc<dyn WindowStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// In-memory store with the system clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryWindowStore::new()), Arc::new(SystemClock))
    }

    pub fn check(
        &self,
        scope: &str,
        client_key: &ClientKey,
        window_ms: u64,
        max_requests: u32,
    ) -> Decision {
        let now = self.clock.now_ms();
        let key = format!("{}:{}", scope, client_key);
        let entry = self.store.hit(&key, now, window_ms);

        if entry.count > max_requests {
            let retry_after = entry.window_reset_at.saturating_sub(now).div_ceil(1000);
            tracing::warn!(
                client = %client_key,
                scope = %scope,
                count = entry.count,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(scope);
            return Decision {
                admitted: false,
                limit: max_requests,
                remaining: 0,
                reset_at: entry.window_reset_at,
                retry_after_secs: Some(retry_after),
            };
        }

        Decision {
            admitted: true,
            limit: max_requests,
            remaining: max_requests - entry.count,
            reset_at: entry.window_reset_at,
            retry_after_secs: None,
        }
    }

    pub fn check_policy(&self, policy: &RoutePolicy, client_key: &ClientKey) -> Decision {
        self.check(
            &policy.scope,
            client_key,
            policy.window_ms,
            policy.max_requests,
        )
    }

    /// Drop expired windows now.
    pub fn sweep(&self) -> usize {
        self.store.sweep(self.clock.now_ms())
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::clock::ManualClock;

    fn limiter(start_ms: u64) -> (WindowRateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start_ms));
        let limiter = WindowRateLimiter::new(Arc::new(MemoryWindowStore::new()), clock.clone());
        (limiter, clock)
    }

    fn user(id: &str) -> ClientKey {
        ClientKey::User(id.to_string())
    }

    #[test]
    fn test_eleventh_request_rejected() {
        let (limiter, _) = limiter(1_700_000_000_000);
        let key = user("u1");

        for n in 1..=10 {
            let d = limiter.check("chat", &key, 60_000, 10);
            assert!(d.admitted, "request {} should be admitted", n);
            assert_eq!(d.remaining, 10 - n);
        }

        let rejected = limiter.check("chat", &key, 60_000, 10);
        assert!(!rejected.admitted);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.limit, 10);
        let retry = rejected.retry_after_secs.unwrap();
        assert!(retry > 0 && retry <= 60);
    }

    #[test]
    fn test_fresh_window_after_reset() {
        let (limiter, clock) = limiter(0);
        let key = ClientKey::Ip("203.0.113.1".to_string());

        for _ in 0..3 {
            limiter.check("geocode", &key, 1_000, 2);
        }
        assert!(!limiter.check("geocode", &key, 1_000, 2).admitted);

        clock.advance(1_000);
        let d = limiter.check("geocode", &key, 1_000, 2);
        assert!(d.admitted);
        assert_eq!(d.remaining, 1);
        assert_eq!(d.reset_at, 2_000);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let (limiter, clock) = limiter(0);
        let key = user("u1");
        limiter.check("s", &key, 10_000, 1);

        clock.advance(8_500);
        let d = limiter.check("s", &key, 10_000, 1);
        assert_eq!(d.retry_after_secs, Some(2));
        assert_eq!(d.reset_at_secs(), 10);
    }

    #[test]
    fn test_scopes_and_clients_are_independent() {
        let (limiter, _) = limiter(0);
        let a = user("a");
        let b = user("b");

        assert!(limiter.check("chat", &a, 60_000, 1).admitted);
        assert!(!limiter.check("chat", &a, 60_000, 1).admitted);
        assert!(limiter.check("booking", &a, 60_000, 1).admitted);
        assert!(limiter.check("chat", &b, 60_000, 1).admitted);
        assert_eq!(limiter.tracked_keys(), 3);
    }

    #[test]
    fn test_parallel_checks_admit_exactly_the_limit() {
        const THREADS: usize = 8;
        const CALLS: usize = 50;
        const MAX: u32 = 100;

        let store = Arc::new(MemoryWindowStore::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let limiter = WindowRateLimiter::new(store.clone(), clock);

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    let key = user("u1");
                    (0..CALLS)
                        .filter(|_| limiter.check("chat", &key, 60_000, MAX).admitted)
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, MAX as usize);

        let entry = store.get("chat:user:u1").unwrap();
        assert_eq!(entry.count as usize, THREADS * CALLS);
    }

    #[test]
    fn test_sweep_uses_clock() {
        let (limiter, clock) = limiter(0);
        limiter.check("chat", &user("a"), 1_000, 5);
        assert_eq!(limiter.sweep(), 0);

        clock.set(1_000);
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked_keys(), 0);
    }
}
