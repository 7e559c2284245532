//! # Planora Core
//!
//! Pure business logic layer - no HTTP, no files.
//!
//! This crate contains:
//! - The `ScheduleService` port the remote service is reached through
//! - Payload normalization into uniform slots
//! - The shared range cache and its coverage/refetch contract
//! - View projections (week days, per-day buckets)
//! - The mutation coordinator and the session that owns them
//!
//! ## Architecture Principles
//! - Only depends on `planora-domain`
//! - All external dependencies via traits
//! - Cache state is an owned, injected object, never a global

pub mod schedule;

// Re-export specific items to avoid ambiguity
pub use schedule::metrics::CacheMetrics;
pub use schedule::mutations::{MutationCoordinator, MutationError, MutationEvent, MutationPhase};
pub use schedule::normalizer::{normalize_payload, normalize_schedule};
pub use schedule::ports::ScheduleService;
pub use schedule::projections::{
    date_key, day_window, group_by_day, group_by_local_day, week_days, week_window, WeekDay,
};
pub use schedule::range_cache::{CacheSnapshot, RangeCache};
pub use schedule::session::ScheduleSession;
