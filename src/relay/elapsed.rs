//! Human-friendly "time ago" strings for delivered messages.
//!
//! Elapsed time is rounded to whole seconds, then coarsened unit by unit: once the value
//! reaches ten of a unit it is rounded to that unit and the next coarser one is tried.
//! So 45 seconds stays `45s`, 5m30s stays `5m30s`, but 15m12s becomes `15m` and 11h40m
//! becomes `12h`.
use chrono::{DateTime, Utc};
use std::time::Duration;

const SECOND: Duration = Duration::from_secs(1);
const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Elapsed wall-clock time between `then` and `now`, zero if `then` is in the future.
pub fn elapsed_between(then: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - then).to_std().unwrap_or(Duration::ZERO)
}

/// Round half away from zero to a multiple of `unit`.
fn round_to(d: Duration, unit: Duration) -> Duration {
    let unit_ms = unit.as_millis();
    let rounded = (d.as_millis() + unit_ms / 2) / unit_ms * unit_ms;
    Duration::from_millis(u64::try_from(rounded).unwrap_or(u64::MAX))
}

pub fn coarsen(elapsed: Duration) -> Duration {
    let mut d = round_to(elapsed, SECOND);
    for unit in [SECOND, MINUTE, HOUR] {
        if d < unit * 10 {
            break;
        }
        d = round_to(d, unit);
    }
    d
}

/// Compact rendering: `0s`, `45s`, `5m30s`, `15m`, `2h5m`, `12h`. Zero components are omitted.
pub fn render(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, total / 60 % 60, total % 60);
    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 || out.is_empty() {
        out.push_str(&format!("{s}s"));
    }
    out
}

/// Coarsened, rendered age of something that happened at `then`.
pub fn ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    render(coarsen(elapsed_between(then, now)))
}
