//! View projections
//!
//! Pure functions shared by the day list and the weekly calendar. Identical
//! input always yields identical output, so views can memoize on it.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use planora_domain::constants::{DATE_KEY_FORMAT, DAYS_PER_WEEK, DAY_LABEL_FORMAT};
use planora_domain::{PlanoraError, Result, Slot, TimeWindow};

/// One column of a Sunday-start week.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeekDay {
    pub date: NaiveDate,
    /// Canonical `YYYY-MM-DD` key, shared with [`group_by_day`].
    pub key: String,
    /// Short display label, e.g. `Sun 5`.
    pub label: String,
}

impl WeekDay {
    fn new(date: NaiveDate) -> Self {
        Self { date, key: date_key(date), label: date.format(DAY_LABEL_FORMAT).to_string() }
    }
}

/// Canonical key for a calendar day.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// The seven days, Sunday first, of the week containing `reference`.
pub fn week_days(reference: NaiveDate) -> [WeekDay; DAYS_PER_WEEK] {
    let sunday = week_start(reference);
    std::array::from_fn(|offset| WeekDay::new(sunday + Duration::days(offset as i64)))
}

/// Bucket slots by the calendar day their start falls on in `tz`.
///
/// Buckets are keyed by [`date_key`] and ordered by start. Days are taken
/// from the local wall clock, never from UTC truncation.
pub fn group_by_day<'a, Tz: TimeZone>(slots: &'a [Slot], tz: &Tz) -> BTreeMap<String, Vec<&'a Slot>> {
    let mut days: BTreeMap<String, Vec<&'a Slot>> = BTreeMap::new();
    for slot in slots {
        let day = slot.start.with_timezone(tz).date_naive();
        days.entry(date_key(day)).or_default().push(slot);
    }

    for bucket in days.values_mut() {
        bucket.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.end.cmp(&b.end))
                .then_with(|| a.key().cmp(&b.key()))
        });
    }
    days
}

/// [`group_by_day`] in the process's local timezone.
pub fn group_by_local_day(slots: &[Slot]) -> BTreeMap<String, Vec<&Slot>> {
    group_by_day(slots, &Local)
}

/// `[local midnight of date, local midnight of the next day)` in `tz`.
pub fn day_window<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<TimeWindow> {
    TimeWindow::new(local_midnight(date, tz)?, local_midnight(date + Duration::days(1), tz)?)
}

/// The Sunday-start week containing `reference`, as a window in `tz`.
pub fn week_window<Tz: TimeZone>(reference: NaiveDate, tz: &Tz) -> Result<TimeWindow> {
    let sunday = week_start(reference);
    TimeWindow::new(
        local_midnight(sunday, tz)?,
        local_midnight(sunday + Duration::days(DAYS_PER_WEEK as i64), tz)?,
    )
}

fn week_start(reference: NaiveDate) -> NaiveDate {
    reference - Duration::days(i64::from(reference.weekday().num_days_from_sunday()))
}

/// First instant of `date` in `tz`. Zones that skip midnight for DST start
/// the day at 01:00.
fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<chrono::DateTime<Tz>> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .ok_or_else(|| PlanoraError::InvalidInput(format!("{date} has no local midnight")))
}
