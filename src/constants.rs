use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Length of a rate-limit window for one client key.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Submissions accepted per client key inside one window.
pub const RATE_LIMIT_MAX: u32 = 5;

pub const DEFAULT_BRAND_NAME: &str = "Portfolio";

/// Client key used when neither a proxy header nor the peer address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";
