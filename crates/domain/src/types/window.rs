//! Half-open time windows

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::wire_time;
use crate::errors::{PlanoraError, Result};

/// Half-open interval `[start, end)`.
///
/// Stored in UTC; comparisons are on absolute instants. A zero-length window
/// is valid and distinct from "no window".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new<Tz: TimeZone>(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        let start = start.with_timezone(&Utc);
        let end = end.with_timezone(&Utc);
        if start > end {
            return Err(PlanoraError::InvalidInput(format!(
                "window start {} is after end {}",
                wire_time::format(&start),
                wire_time::format(&end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Inclusive start, UTC.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end, UTC.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Zero length.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// `self` is a superset of `other`.
    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    /// Smallest window containing both.
    pub fn union(&self, other: &TimeWindow) -> TimeWindow {
        TimeWindow { start: self.start.min(other.start), end: self.end.max(other.end) }
    }

    /// Whether `instant` lies in `[start, end)`.
    pub fn contains<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> bool {
        let instant = instant.with_timezone(&Utc);
        self.start <= instant && instant < self.end
    }

    /// Whether `[start, end)` shares at least one instant with this window.
    pub fn overlaps<Tz: TimeZone>(&self, start: &DateTime<Tz>, end: &DateTime<Tz>) -> bool {
        let start = start.with_timezone(&Utc);
        let end = end.with_timezone(&Utc);
        start < self.end && end > self.start
    }

    /// `start` formatted for a query parameter, truncated to the second.
    pub fn start_param(&self) -> String {
        wire_time::format(&self.start)
    }

    /// `end` formatted for a query parameter, rounded up to the second so
    /// the requested range is never narrower than the window.
    pub fn end_param(&self) -> String {
        wire_time::format_ceil(&self.end)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_param(), self.end_param())
    }
}
