use std::time::Instant;

use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::limiter::rate_limiter::FixedWindowLimiter;

/// Periodically drops rate-limit entries whose window has closed.
pub async fn start_rate_limit_sweep(limiter: FixedWindowLimiter, every: Duration) {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let removed = limiter.purge_expired(Instant::now());
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = limiter.tracked_clients(),
                "Swept expired rate-limit entries"
            );
        }
    }
}
