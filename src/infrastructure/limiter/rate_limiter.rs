use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use dashmap::{mapref::entry::Entry, DashMap};

use crate::constants::{RATE_LIMIT_MAX, RATE_LIMIT_WINDOW};

/// Per-key counter for the current fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: Instant,
}

impl RateLimitEntry {
    fn open(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            reset_at: now + window,
        }
    }

    /// A window is live while `now < reset_at`.
    fn is_live(&self, now: Instant) -> bool {
        now < self.reset_at
    }
}

type Key = String;

/// Fixed-window limiter keyed by client identifier.
///
/// `allow` is the only mutator. Each key is updated under its shard lock
/// through the entry API, so concurrent requests from one key can never push
/// `count` past the limit.
#[derive(Clone, Debug)]
pub struct FixedWindowLimiter {
    map: Arc<DashMap<Key, RateLimitEntry>>,
    window: Duration,
    max: u32,
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_WINDOW, RATE_LIMIT_MAX)
    }
}

impl FixedWindowLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            window,
            max,
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock reading.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        match self.map.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateLimitEntry::open(now, self.window));
                true
            }
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if !entry.is_live(now) {
                    *entry = RateLimitEntry::open(now, self.window);
                    true
                } else if entry.count >= self.max {
                    false
                } else {
                    entry.count += 1;
                    true
                }
            }
        }
    }

    /// Drops entries whose window has closed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.map.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.map.len()
    }

    pub fn entry(&self, key: &str) -> Option<RateLimitEntry> {
        self.map.get(key).map(|e| *e.value())
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_call_inside_window_is_rejected() {
        let limiter = FixedWindowLimiter::default();
        let start = Instant::now();

        for i in 0..5 {
            assert!(limiter.allow_at("10.0.0.1", start + Duration::from_secs(i)));
        }
        assert!(!limiter.allow_at("10.0.0.1", start + Duration::from_secs(59)));
        assert_eq!(limiter.entry("10.0.0.1").unwrap().count, 5);
    }

    #[test]
    fn window_expiry_resets_count_to_one() {
        let limiter = FixedWindowLimiter::default();
        let start = Instant::now();

        for _ in 0..6 {
            limiter.allow_at("client", start);
        }
        let after = start + RATE_LIMIT_WINDOW;
        assert!(limiter.allow_at("client", after));

        let entry = limiter.entry("client").unwrap();
        assert_eq!(entry.count, 1);
        assert_eq!(entry.reset_at, after + RATE_LIMIT_WINDOW);
    }

    #[test]
    fn rejected_call_does_not_mutate_entry() {
        let limiter = FixedWindowLimiter::new(Duration::from_secs(60), 1);
        let start = Instant::now();

        assert!(limiter.allow_at("k", start));
        let before = limiter.entry("k").unwrap();
        assert!(!limiter.allow_at("k", start + Duration::from_secs(1)));
        assert_eq!(limiter.entry("k").unwrap(), before);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = FixedWindowLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();

        assert!(limiter.allow_at("a", now));
        assert!(!limiter.allow_at("a", now));
        assert!(limiter.allow_at("b", now));
        assert!(limiter.allow_at("unknown", now));
        assert!(limiter.allow_at("", now));
    }

    #[test]
    fn purge_removes_only_closed_windows() {
        let limiter = FixedWindowLimiter::default();
        let start = Instant::now();

        limiter.allow_at("old", start);
        limiter.allow_at("fresh", start + Duration::from_secs(30));

        let removed = limiter.purge_expired(start + Duration::from_secs(60));
        assert_eq!(removed, 1);
        assert!(limiter.entry("old").is_none());
        assert!(limiter.entry("fresh").is_some());
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn concurrent_callers_never_exceed_max() {
        let limiter = FixedWindowLimiter::default();
        let now = Instant::now();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..8).filter(|_| limiter.allow_at("k", now)).count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(admitted, RATE_LIMIT_MAX as usize);
        assert_eq!(limiter.entry("k").unwrap().count, RATE_LIMIT_MAX);
    }

    #[test]
    fn clones_share_state() {
        let limiter = FixedWindowLimiter::new(Duration::from_secs(60), 1);
        let clone = limiter.clone();
        let now = Instant::now();

        assert!(limiter.allow_at("shared", now));
        assert!(!clone.allow_at("shared", now));
    }
}
