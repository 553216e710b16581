//! Progress samples and remaining-time estimation

use std::time::Duration;

/// Snapshot of a download taken at one reporting tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressSample {
    /// Bytes delivered so far
    pub observed: u64,
    /// Advertised total, if known
    pub total: Option<u64>,
    /// Bytes still expected, if the total is known
    pub remaining_bytes: Option<u64>,
    /// Time since the download started
    pub elapsed: Duration,
    /// Extrapolated time to completion at the average rate so far
    pub estimated_remaining: Option<Duration>,
}

impl ProgressSample {
    /// Build a sample from raw counters
    pub fn new(observed: u64, total: Option<u64>, elapsed: Duration) -> Self {
        let remaining_bytes = total.map(|t| t.saturating_sub(observed));
        let estimated_remaining = total.and_then(|t| estimate_remaining(elapsed, observed, t));
        Self {
            observed,
            total,
            remaining_bytes,
            elapsed,
            estimated_remaining,
        }
    }

    /// Average throughput in bytes per second
    pub fn bytes_per_sec(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.observed as f64 / secs) as u64
        } else {
            0
        }
    }
}

/// Estimate time to completion as `elapsed * remaining / observed`
///
/// Returns `None` before the first byte arrives.
pub fn estimate_remaining(elapsed: Duration, observed: u64, total: u64) -> Option<Duration> {
    if observed == 0 {
        return None;
    }
    let remaining = u128::from(total.saturating_sub(observed));
    let nanos = elapsed.as_nanos() * remaining / u128::from(observed);
    Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
}

/// Render a duration rounded to whole seconds, e.g. `1h2m3s`, `4m0s`, `17s`
pub fn format_remaining(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    if duration.subsec_millis() >= 500 {
        secs += 1;
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
