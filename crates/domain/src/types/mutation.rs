//! Request and response records for schedule mutations
//!
//! Each request serializes to the JSON body of its `POST` endpoint.
//! Constructors validate what the service would otherwise reject late.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::slot::{Slot, SlotKey, SlotKind};
use super::window::TimeWindow;
use super::wire_time;
use crate::errors::{PlanoraError, Result};

/// Body of `POST /create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRequest {
    pub kind: SlotKind,
    pub name: String,
    #[serde(rename = "start_end_times", serialize_with = "wire_time::serialize_pairs")]
    pub occurrences: Vec<TimeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort_minutes: Option<u32>,
}

impl CreateRequest {
    /// Create request for a new entity with at least one occurrence.
    pub fn new(kind: SlotKind, name: impl Into<String>, occurrences: Vec<TimeWindow>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PlanoraError::InvalidInput("name must not be empty".into()));
        }
        if occurrences.is_empty() {
            return Err(PlanoraError::InvalidInput(format!("{kind} needs at least one occurrence")));
        }
        if let Some(empty) = occurrences.iter().find(|w| w.is_empty()) {
            return Err(PlanoraError::InvalidInput(format!("occurrence {empty} has no duration")));
        }
        Ok(Self { kind, name, occurrences, effort_minutes: None })
    }

    /// Effort estimate used by the service when scheduling.
    pub fn with_effort_minutes(mut self, minutes: u32) -> Self {
        self.effort_minutes = Some(minutes);
        self
    }
}

/// Body of `POST /update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRequest {
    pub kind: SlotKind,
    #[serde(rename = "id")]
    pub parent_id: String,
    pub occurrence_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "wire_time::serialize_option")]
    pub start: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "wire_time::serialize_option")]
    pub end: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateRequest {
    /// Start an update addressed at one occurrence.
    ///
    /// The service accepts updates for meetings and assignments only.
    pub fn for_slot(key: &SlotKey) -> Result<Self> {
        if key.kind == SlotKind::Chore {
            return Err(PlanoraError::InvalidInput(format!(
                "{key}: chores cannot be updated, reschedule them instead"
            )));
        }
        Ok(Self {
            kind: key.kind,
            parent_id: key.parent_id.clone(),
            occurrence_id: key.occurrence_id.clone(),
            name: None,
            start: None,
            end: None,
            completed: None,
        })
    }

    /// Set a new name.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Move the occurrence; rejects `start >= end`.
    pub fn retime(mut self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<Self> {
        if start >= end {
            return Err(PlanoraError::InvalidInput(format!(
                "new start {} is not before new end {}",
                wire_time::format(&start),
                wire_time::format(&end)
            )));
        }
        self.start = Some(start);
        self.end = Some(end);
        Ok(self)
    }

    /// Set completion; meetings have no completion state.
    pub fn mark_completed(mut self, completed: bool) -> Result<Self> {
        if !self.kind.has_completion() {
            return Err(PlanoraError::InvalidInput(format!(
                "{} has no completion state",
                self.kind
            )));
        }
        self.completed = Some(completed);
        Ok(self)
    }

    /// Target occurrence.
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.kind, self.parent_id.clone(), self.occurrence_id.clone())
    }

    /// True when no field would change.
    pub fn is_noop(&self) -> bool {
        self.name.is_none() && self.start.is_none() && self.end.is_none() && self.completed.is_none()
    }
}

/// How far a delete reaches into a recurring series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    ThisOccurrence,
    ThisAndFuture,
}

/// Body of `POST /delete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRequest {
    pub kind: SlotKind,
    #[serde(rename = "id")]
    pub parent_id: String,
    pub occurrence_id: String,
    /// `true` deletes this and all future occurrences.
    pub future: bool,
}

impl DeleteRequest {
    /// Delete `key`, alone or with every later occurrence.
    pub fn new(key: &SlotKey, scope: DeleteScope) -> Self {
        Self {
            kind: key.kind,
            parent_id: key.parent_id.clone(),
            occurrence_id: key.occurrence_id.clone(),
            future: scope == DeleteScope::ThisAndFuture,
        }
    }

    /// Which occurrences the delete reaches.
    pub fn scope(&self) -> DeleteScope {
        if self.future {
            DeleteScope::ThisAndFuture
        } else {
            DeleteScope::ThisOccurrence
        }
    }

    /// Target occurrence.
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.kind, self.parent_id.clone(), self.occurrence_id.clone())
    }
}

/// Body of `POST /reschedule`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RescheduleRequest {
    pub kind: SlotKind,
    #[serde(rename = "id")]
    pub parent_id: String,
    pub occurrence_id: String,
    pub effort_minutes: u32,
    #[serde(serialize_with = "wire_time::serialize")]
    pub window_start: DateTime<chrono::Utc>,
    #[serde(serialize_with = "wire_time::serialize")]
    pub window_end: DateTime<chrono::Utc>,
    pub allow_overlaps: bool,
}

impl RescheduleRequest {
    /// Ask the service for a new schedule of an assignment or chore
    /// occurrence, placed inside `window`.
    pub fn new(key: &SlotKey, effort_minutes: u32, window: TimeWindow, allow_overlaps: bool) -> Result<Self> {
        if !key.kind.has_completion() {
            return Err(PlanoraError::InvalidInput(format!(
                "{key}: only assignments and chores can be rescheduled"
            )));
        }
        if effort_minutes == 0 {
            return Err(PlanoraError::InvalidInput("effort must be at least one minute".into()));
        }
        if window.is_empty() {
            return Err(PlanoraError::InvalidInput(format!("reschedule window {window} is empty")));
        }
        Ok(Self {
            kind: key.kind,
            parent_id: key.parent_id.clone(),
            occurrence_id: key.occurrence_id.clone(),
            effort_minutes,
            window_start: window.start(),
            window_end: window.end(),
            allow_overlaps,
        })
    }

    /// Target occurrence.
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.kind, self.parent_id.clone(), self.occurrence_id.clone())
    }
}

/// Candidate schedule returned by `POST /reschedule`, for the user to review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleProposal {
    /// Candidate slots, normalized and start-ascending.
    pub slots: Vec<Slot>,
    /// Response body as received.
    pub raw: serde_json::Value,
}
