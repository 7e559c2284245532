//! Shared test helpers for `planora-core` integration tests.
//!
//! A scriptable in-memory schedule service plus slot/window fixtures, so the
//! cache and mutation tests can focus on ordering and consistency.

#![allow(dead_code)]

pub mod service;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use planora_domain::{Slot, SlotKind, TimeWindow};

pub use service::FakeScheduleService;

/// Midnight UTC on the given day of January 2025.
pub fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()
}

/// `[day from, day to)` in January 2025.
pub fn window(from: u32, to: u32) -> TimeWindow {
    TimeWindow::new(day(from), day(to)).unwrap()
}

/// A one-hour slot starting at `hour` UTC on `on_day`.
pub fn slot(kind: SlotKind, parent: &str, occurrence: &str, name: &str, on_day: u32, hour: i64) -> Slot {
    let start: DateTime<FixedOffset> = (day(on_day) + Duration::hours(hour)).fixed_offset();
    Slot::new(kind, parent, occurrence, name, start, start + Duration::hours(1), false).unwrap()
}
