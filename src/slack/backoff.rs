//! How long to wait after Slack tells us to slow down.
//!
//! <https://api.slack.com/apis/rate-limits>

use rand::Rng;
use std::time::Duration;

/// Used when a rate limited response doesn't say how long to wait.
pub const DEFAULT_RETRY_AFTER: u64 = 1;

/// Upper bound on the server hint, in seconds.
pub const MAX_RETRY_AFTER: u64 = 30;

/// Upper bound on the random jitter added to the hint, in seconds.
pub const MAX_JITTER: f64 = 10.0;

/// `min(hint, 30) + uniform(0, 10)` seconds.
pub fn delay(retry_after: Option<u64>) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.0..MAX_JITTER);
    delay_with_jitter(retry_after, jitter)
}

pub fn delay_with_jitter(retry_after: Option<u64>, jitter: f64) -> Duration {
    let base = retry_after
        .unwrap_or(DEFAULT_RETRY_AFTER)
        .min(MAX_RETRY_AFTER);

    Duration::from_secs(base) + Duration::from_secs_f64(jitter.clamp(0.0, MAX_JITTER))
}
