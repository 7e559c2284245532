//! The uniform slot record every view and the cache operate on

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use super::window::TimeWindow;
use super::wire_time;
use crate::errors::{PlanoraError, Result};
use crate::impl_domain_status_conversions;

/// Which kind of schedule entity a slot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Meeting,
    Assignment,
    Chore,
}

impl_domain_status_conversions!(SlotKind {
    Meeting => "meeting",
    Assignment => "assignment",
    Chore => "chore",
});

impl SlotKind {
    pub const ALL: [SlotKind; 3] = [SlotKind::Meeting, SlotKind::Assignment, SlotKind::Chore];

    /// Meetings have no completion concept.
    pub fn has_completion(self) -> bool {
        !matches!(self, SlotKind::Meeting)
    }

    /// Top-level key of this kind's collection in a fetch response.
    pub fn collection_key(self) -> &'static str {
        match self {
            SlotKind::Meeting => "meetings",
            SlotKind::Assignment => "assignments",
            SlotKind::Chore => "chores",
        }
    }
}

/// Identity of one occurrence: unique within a materialized window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub kind: SlotKind,
    pub parent_id: String,
    pub occurrence_id: String,
}

impl SlotKey {
    /// Key for occurrence `occurrence_id` of parent `parent_id`.
    pub fn new(kind: SlotKind, parent_id: impl Into<String>, occurrence_id: impl Into<String>) -> Self {
        Self { kind, parent_id: parent_id.into(), occurrence_id: occurrence_id.into() }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.kind, self.parent_id, self.occurrence_id)
    }
}

/// One scheduled occurrence of a meeting, assignment or chore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub kind: SlotKind,
    pub name: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub occurrence_id: String,
    pub parent_id: String,
    /// `None` for meetings, `Some` for assignments and chores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl Slot {
    /// Build a validated slot.
    ///
    /// `completed` is kept only for kinds with a completion concept. Fails
    /// with `InvalidInput` unless `start < end`.
    pub fn new(
        kind: SlotKind,
        parent_id: impl Into<String>,
        occurrence_id: impl Into<String>,
        name: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        completed: bool,
    ) -> Result<Self> {
        let parent_id = parent_id.into();
        let occurrence_id = occurrence_id.into();
        if start >= end {
            return Err(PlanoraError::InvalidInput(format!(
                "{kind} {parent_id}#{occurrence_id}: start {} is not before end {}",
                wire_time::format(&start),
                wire_time::format(&end)
            )));
        }

        Ok(Self {
            kind,
            name: name.into(),
            start,
            end,
            occurrence_id,
            parent_id,
            completed: kind.has_completion().then_some(completed),
        })
    }

    /// Identity of this occurrence.
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.kind, self.parent_id.clone(), self.occurrence_id.clone())
    }

    /// Whether this slot has identity `key`.
    pub fn matches(&self, key: &SlotKey) -> bool {
        self.kind == key.kind && self.parent_id == key.parent_id && self.occurrence_id == key.occurrence_id
    }

    /// `end - start`; always positive.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether any part of `[start, end)` falls inside `window`.
    pub fn overlaps(&self, window: &TimeWindow) -> bool {
        window.overlaps(&self.start, &self.end)
    }
}
