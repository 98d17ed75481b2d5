//! Periodic removal of expired windows.
//!
//! Keeps memory proportional to recently active clients rather than every
//! client ever seen. Runs off the request path.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::observability::metrics;
use crate::rate_limit::limiter::WindowRateLimiter;

pub fn spawn_sweeper(
    limiter: WindowRateLimiter,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(interval_secs = interval.as_secs_f64(), "Rate limit sweeper starting");

        let mut ticker = time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep();
                    let remaining = limiter.tracked_keys();
                    metrics::record_rate_limit_entries(remaining);
                    if removed > 0 {
                        tracing::debug!(removed, remaining, "Swept expired rate limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ClientKey;
    use crate::rate_limit::clock::ManualClock;
    use crate::rate_limit::store::MemoryWindowStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sweeper_removes_expired_and_stops() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = WindowRateLimiter::new(Arc::new(MemoryWindowStore::new()), clock.clone());
        limiter.check("chat", &ClientKey::User("u1".into()), 1_000, 10);
        limiter.check("chat", &ClientKey::User("u2".into()), 5_000, 10);
        clock.set(2_000);

        let (tx, rx) = broadcast::channel(1);
        let handle = spawn_sweeper(limiter.clone(), Duration::from_millis(10), rx);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(limiter.tracked_keys(), 1);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop on shutdown")
            .unwrap();
    }
}
