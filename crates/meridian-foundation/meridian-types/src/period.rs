use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// An hour-granularity aggregation bucket.
///
/// Cost records carry hour-granularity timestamps; a `Period` is that
/// timestamp truncated to the hour, ordered and hashable so it can key
/// baselines and gap-fill logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period(DateTime<Utc>);

impl Period {
    /// Truncate a timestamp to its containing hourly period
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        let truncated = ts
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(ts);
        Period(truncated)
    }

    /// The period's start timestamp
    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }

    /// The immediately following period
    pub fn next(&self) -> Self {
        Period(self.0 + Duration::hours(1))
    }

    /// Number of whole periods from `self` (exclusive) to `other` (inclusive).
    ///
    /// Returns 0 when `other` is not after `self`.
    pub fn distance_to(&self, other: &Period) -> usize {
        if other.0 <= self.0 {
            return 0;
        }
        ((other.0 - self.0).num_hours()) as usize
    }

    /// Period for unix hour zero, useful as a fixed test origin
    pub fn epoch() -> Self {
        Period(Utc.timestamp_opt(0, 0).unwrap())
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:00Z"))
    }
}
