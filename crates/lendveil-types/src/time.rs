use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in time, in whole seconds since the Unix epoch.
///
/// Seconds are the only unit used inside the engine. Raw values coming from
/// a ledger or a client go through [`TimeUnit::to_timestamp`] first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Convert from a chrono timestamp; instants before the epoch clamp to zero.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(u64::try_from(dt.timestamp()).unwrap_or(0))
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.0).ok()?, 0)
    }

    pub fn checked_add(&self, period: Duration) -> Option<Timestamp> {
        self.0.checked_add(period.as_secs()).map(Timestamp)
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is in the future.
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_secs(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{} ({})", self.0, dt.to_rfc3339()),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Unit of raw timestamps exchanged with an external system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    /// Interpret a raw value in this unit. Sub-second precision is dropped.
    pub fn to_timestamp(&self, raw: u64) -> Timestamp {
        match self {
            TimeUnit::Seconds => Timestamp(raw),
            TimeUnit::Milliseconds => Timestamp(raw / 1_000),
        }
    }

    /// Express a timestamp as a raw value in this unit, saturating on overflow.
    pub fn from_timestamp(&self, ts: Timestamp) -> u64 {
        match self {
            TimeUnit::Seconds => ts.0,
            TimeUnit::Milliseconds => ts.0.saturating_mul(1_000),
        }
    }
}

/// Serde adapter storing a `Duration` as whole seconds.
pub mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
