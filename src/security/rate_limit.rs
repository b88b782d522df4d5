//! Per-client fixed-window rate limiting.
//!
//! Each client identity owns one window `{count, window_start}`. A request
//! either starts a fresh window (no window yet, or the old one has expired),
//! increments the current one while under capacity, or is rejected without
//! touching the count. Windows reset on a fixed boundary, so a client can be
//! admitted up to twice the capacity across a boundary.

use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::RateLimitConfig;
use crate::security::identity::ClientIdentity;

/// Window state for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub window_start: Instant,
}

/// Outcome of [`RateLimiter::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Count in the client's window after this call.
    pub count: u32,
}

pub struct RateLimiter {
    windows: DashMap<ClientIdentity, RateWindow>,
    window: Duration,
    capacity: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, capacity: u32) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            capacity,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(Duration::from_secs(config.window_secs), config.max_requests)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn admit(&self, identity: &ClientIdentity) -> RateDecision {
        self.admit_at(identity, Instant::now())
    }

    /// Same as [`admit`](Self::admit) with an explicit clock reading.
    pub fn admit_at(&self, identity: &ClientIdentity, now: Instant) -> RateDecision {
        match self.windows.entry(identity.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(RateWindow {
                    count: 1,
                    window_start: now,
                });
                RateDecision {
                    allowed: true,
                    count: 1,
                }
            }
            Entry::Occupied(mut slot) => {
                let window = slot.get_mut();
                if now.saturating_duration_since(window.window_start) >= self.window {
                    *window = RateWindow {
                        count: 1,
                        window_start: now,
                    };
                    RateDecision {
                        allowed: true,
                        count: 1,
                    }
                } else if window.count < self.capacity {
                    window.count += 1;
                    RateDecision {
                        allowed: true,
                        count: window.count,
                    }
                } else {
                    RateDecision {
                        allowed: false,
                        count: window.count,
                    }
                }
            }
        }
    }

    pub fn window_for(&self, identity: &ClientIdentity) -> Option<RateWindow> {
        self.windows.get(identity).map(|w| *w)
    }

    /// Number of clients with a window on record.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Drop windows that started at least `max_age` before `now`. Returns the
    /// number removed.
    pub fn evict_stale(&self, now: Instant, max_age: Duration) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.window_start) < max_age);
        before.saturating_sub(self.windows.len())
    }

    /// Periodically sweep stale windows until shutdown.
    pub async fn run_eviction(
        &self,
        every: Duration,
        max_age: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.evict_stale(Instant::now(), max_age);
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.tracked_clients(), "Evicted stale rate windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate window eviction stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(300);

    fn id(s: &str) -> ClientIdentity {
        ClientIdentity::normalize(s)
    }

    #[test]
    fn test_rejects_once_capacity_reached() {
        let limiter = RateLimiter::new(WINDOW, 3);
        let client = id("203.0.113.5");
        let t0 = Instant::now();

        for n in 1..=3 {
            let d = limiter.admit_at(&client, t0 + Duration::from_secs(n));
            assert!(d.allowed);
            assert_eq!(d.count, n as u32);
        }

        let d = limiter.admit_at(&client, t0 + Duration::from_secs(10));
        assert_eq!(d, RateDecision { allowed: false, count: 3 });
        // Rejections do not grow the count.
        assert_eq!(limiter.window_for(&client).unwrap().count, 3);
    }

    #[test]
    fn test_expired_window_restarts_at_one() {
        let limiter = RateLimiter::new(WINDOW, 2);
        let client = id("203.0.113.5");
        let t0 = Instant::now();

        limiter.admit_at(&client, t0);
        limiter.admit_at(&client, t0);
        assert!(!limiter.admit_at(&client, t0 + Duration::from_secs(299)).allowed);

        let later = t0 + WINDOW;
        let d = limiter.admit_at(&client, later);
        assert_eq!(d, RateDecision { allowed: true, count: 1 });
        assert_eq!(
            limiter.window_for(&client),
            Some(RateWindow { count: 1, window_start: later })
        );
    }

    #[test]
    fn test_boundary_burst_admits_twice_capacity() {
        let limiter = RateLimiter::new(WINDOW, 5);
        let client = id("198.51.100.7");
        let t0 = Instant::now();

        assert!(limiter.admit_at(&client, t0).allowed);
        let late = (0..4)
            .filter(|_| limiter.admit_at(&client, t0 + Duration::from_secs(299)).allowed)
            .count();
        let early = (0..5)
            .filter(|_| limiter.admit_at(&client, t0 + WINDOW).allowed)
            .count();

        // Nine admissions inside one second straddling the boundary.
        assert_eq!(late, 4);
        assert_eq!(early, 5);
        assert!(!limiter.admit_at(&client, t0 + WINDOW).allowed);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(WINDOW, 1);
        let t0 = Instant::now();

        assert!(limiter.admit_at(&id("192.0.2.1"), t0).allowed);
        assert!(!limiter.admit_at(&id("192.0.2.1"), t0).allowed);
        assert!(limiter.admit_at(&id("::ffff:192.0.2.2"), t0).allowed);
        assert!(!limiter.admit_at(&id("192.0.2.2"), t0).allowed);
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_evict_stale_keeps_live_windows() {
        let limiter = RateLimiter::new(WINDOW, 10);
        let t0 = Instant::now();

        limiter.admit_at(&id("192.0.2.1"), t0);
        limiter.admit_at(&id("192.0.2.2"), t0 + Duration::from_secs(400));

        let removed = limiter.evict_stale(t0 + Duration::from_secs(600), WINDOW * 2);
        assert_eq!(removed, 1);
        assert!(limiter.window_for(&id("192.0.2.1")).is_none());
        assert!(limiter.window_for(&id("192.0.2.2")).is_some());
    }

    #[test]
    fn test_concurrent_admits_never_exceed_capacity() {
        let limiter = Arc::new(RateLimiter::new(WINDOW, 100));
        let client = id("203.0.113.9");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                let client = client.clone();
                std::thread::spawn(move || (0..50).filter(|_| limiter.admit(&client).allowed).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_task_stops_on_shutdown() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1), 10));
        limiter.admit(&id("192.0.2.1"));

        let (tx, rx) = broadcast::channel(1);
        let task = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter
                    .run_eviction(Duration::from_secs(1), Duration::from_secs(2), rx)
                    .await
            })
        };

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(limiter.tracked_clients(), 0);

        tx.send(()).unwrap();
        task.await.unwrap();
    }
}
