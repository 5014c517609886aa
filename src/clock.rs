//! Clock-skew detection
//!
//! GitHub rejects app JWTs whose `iat` lies in its future or whose `exp` has
//! already passed, so a skewed local clock shows up as a confusing 401. The
//! server's `Date` header is compared with local time to surface that early.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Skew (in either direction) above which a warning is logged
pub const MAX_CLOCK_SKEW_SECS: i64 = 30;

/// Server time versus local time at the moment a response arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSkew {
    pub server: DateTime<Utc>,
    pub local: DateTime<Utc>,
}

impl ClockSkew {
    pub fn new(server: DateTime<Utc>, local: DateTime<Utc>) -> Self {
        Self { server, local }
    }

    /// Positive when the server is ahead of the local clock
    pub fn seconds(&self) -> i64 {
        (self.server - self.local).num_seconds()
    }

    /// Whether the skew is large enough to risk the JWT being rejected
    pub fn is_significant(&self) -> bool {
        self.seconds().abs() > MAX_CLOCK_SKEW_SECS
    }

    /// Log the measurement; never fails
    pub fn report(&self) {
        let skew = self.seconds();
        if self.is_significant() {
            warn!(
                skew_secs = skew,
                server = %self.server.to_rfc2822(),
                local = %self.local.to_rfc2822(),
                "⚠️  Clock skew of {}s between local and server time; the JWT may be rejected",
                skew
            );
        } else {
            debug!(skew_secs = skew, "Clock skew within tolerance");
        }
    }
}

/// Parse an HTTP `Date` header (IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
