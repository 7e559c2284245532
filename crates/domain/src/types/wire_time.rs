//! Timestamp format for outbound requests.
//!
//! The schedule service's parser rejects the `Z` suffix, so every timestamp
//! we send is RFC 3339 with seconds precision and a numeric offset
//! (`2025-01-01T00:00:00+00:00`). Use these helpers with
//! `#[serde(serialize_with = ...)]` instead of chrono's default impl.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, TimeZone};
use serde::Serializer;

use super::window::TimeWindow;

/// Format a timestamp for the wire.
pub fn format<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant.fixed_offset().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Format a timestamp rounded up to the next whole second.
///
/// The end of a requested range must not shrink on the wire, or a response
/// for a shorter range would be recorded as covering the longer one.
pub fn format_ceil<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    let whole = instant.clone().trunc_subsecs(0);
    if whole < *instant {
        format(&(whole + Duration::seconds(1)))
    } else {
        format(&whole)
    }
}

/// Serde adapter for [`format`].
pub fn serialize<S, Tz>(instant: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    Tz: TimeZone,
{
    serializer.serialize_str(&format(instant))
}

/// Serde adapter for optional timestamps.
pub fn serialize_option<S, Tz>(
    instant: &Option<DateTime<Tz>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    Tz: TimeZone,
{
    match instant {
        Some(instant) => serializer.serialize_some(&format(instant)),
        None => serializer.serialize_none(),
    }
}

/// Serialize windows as the `[["start","end"], ...]` pair list the service
/// accepts for occurrence times.
pub fn serialize_pairs<S>(windows: &[TimeWindow], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(windows.iter().map(|w| [format(&w.start()), format(&w.end())]))
}
