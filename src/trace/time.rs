//! Trace time offsets and the wall-clock reference they hang off

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Microseconds since the session time reference.
///
/// Every timestamped trace line carries a `<s>s:<ms>ms:<us>us` offset; the
/// engine keeps these relative and only converts to wall-clock for display.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TraceTime(u64);

impl TraceTime {
    pub const ZERO: TraceTime = TraceTime(0);
    pub const MAX: TraceTime = TraceTime(u64::MAX);

    pub fn from_parts(secs: u64, millis: u64, micros: u64) -> Self {
        Self(secs * 1_000_000 + millis * 1_000 + micros)
    }

    pub fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn advanced_by(&self, micros: u64) -> TraceTime {
        TraceTime(self.0.saturating_add(micros))
    }
}

impl fmt::Display for TraceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / 1_000_000;
        let millis = (self.0 / 1_000) % 1_000;
        let micros = self.0 % 1_000;
        write!(f, "{}s:{}ms:{}us", secs, millis, micros)
    }
}

/// Wall-clock anchor the relative trace offsets are added to.
///
/// Supplied by the caller (the runtime records it alongside the trace);
/// defaults to the Unix epoch, which keeps offline scans deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeReference(DateTime<Utc>);

impl TimeReference {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(start)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn wall_clock(&self, time: TraceTime) -> DateTime<Utc> {
        self.0 + Duration::microseconds(time.as_micros() as i64)
    }
}

impl Default for TimeReference {
    fn default() -> Self {
        Self(DateTime::<Utc>::UNIX_EPOCH)
    }
}
