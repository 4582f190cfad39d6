use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::claims::DecodedClaims;

/// Source of the local wall-clock time.
pub trait Clock: Send + Sync {
    /// Whole seconds since the Unix epoch.
    fn now(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// How long to wait before a token issued with `claims` becomes valid by our clock.
///
/// Returns `None` when the token is already valid, or when there is no
/// not-before claim to compare against.
pub fn skew_wait(claims: Option<&DecodedClaims>, now: i64) -> Option<Duration> {
    let nbf = claims?.nbf?;
    if nbf > now {
        Some(Duration::from_secs((nbf - now) as u64))
    } else {
        None
    }
}
