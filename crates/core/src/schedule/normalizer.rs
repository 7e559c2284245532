//! Payload normalizer
//!
//! Converts the three entity shapes of a fetch response into one flat,
//! start-ascending sequence of [`Slot`]s. Malformed entities and malformed
//! occurrences are dropped with a warning; only a payload whose top level is
//! not an object of arrays fails as a whole.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use planora_domain::{PlanoraError, Result, Slot, SlotKey, SlotKind};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Entity ids arrive as numbers or strings; both are carried as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(serde_json::Number),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// `["start", "end"]` or `{ "start": .., "end": .. }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPair {
    Tuple(String, String),
    Named { start: String, end: String },
}

impl RawPair {
    fn bounds(&self) -> (&str, &str) {
        match self {
            RawPair::Tuple(start, end) | RawPair::Named { start, end } => (start, end),
        }
    }
}

/// Resolved occurrence inside a computed schedule.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScheduledSlot {
    Detailed {
        start: String,
        end: String,
        #[serde(default)]
        occurrence_id: Option<RawId>,
        #[serde(default)]
        completed: Option<bool>,
    },
    Pair(String, String),
}

#[derive(Debug, Default, Deserialize)]
struct RawSchedule {
    #[serde(default)]
    slots: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    id: RawId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    start_end_times: Option<Vec<Value>>,
    #[serde(default)]
    occurrence_ids: Option<Vec<Option<RawId>>>,
    #[serde(default)]
    completed: Option<Vec<Option<bool>>>,
    #[serde(default)]
    schedule: Option<RawSchedule>,
}

/// One occurrence before validation.
struct Occurrence {
    start: String,
    end: String,
    occurrence_id: Option<String>,
    completed: Option<bool>,
}

/// Normalize a full fetch response.
///
/// Absent or `null` collections count as empty. Duplicated
/// `(kind, parent, occurrence)` keys keep the copy that appears last.
///
/// # Errors
/// `MalformedPayload` if the payload is not an object or a collection is not
/// an array.
pub fn normalize_payload(payload: &Value) -> Result<Vec<Slot>> {
    let object = payload.as_object().ok_or_else(|| {
        PlanoraError::MalformedPayload(format!(
            "expected a JSON object at the top level, found {}",
            json_type(payload)
        ))
    })?;

    let mut slots = Vec::new();
    for kind in SlotKind::ALL {
        let entities = match object.get(kind.collection_key()) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(entities)) => entities,
            Some(other) => {
                return Err(PlanoraError::MalformedPayload(format!(
                    "`{}` must be an array, found {}",
                    kind.collection_key(),
                    json_type(other)
                )))
            }
        };

        for entity in entities {
            slots.extend(normalize_entity(kind, entity));
        }
    }

    Ok(dedupe_and_sort(slots))
}

/// Normalize a standalone computed schedule, as returned by a reschedule
/// request: `{ "schedule": { "slots": [...] } }` or `{ "slots": [...] }`.
///
/// # Errors
/// `MalformedPayload` if neither shape is present.
pub fn normalize_schedule(
    kind: SlotKind,
    parent_id: &str,
    name: &str,
    payload: &Value,
) -> Result<Vec<Slot>> {
    let schedule = payload.get("schedule").unwrap_or(payload);
    let Some(Value::Array(raw_slots)) = schedule.get("slots") else {
        return Err(PlanoraError::MalformedPayload(
            "reschedule response carries no `schedule.slots` list".into(),
        ));
    };

    let occurrences = scheduled_occurrences(kind, parent_id, raw_slots, &[], &[]);
    let slots = build_slots(kind, parent_id, name, occurrences);
    Ok(dedupe_and_sort(slots))
}

fn normalize_entity(kind: SlotKind, value: &Value) -> Vec<Slot> {
    let entity = match RawEntity::deserialize(value) {
        Ok(entity) => entity,
        Err(err) => {
            warn!(%kind, error = %err, "dropping malformed entity");
            return Vec::new();
        }
    };

    let parent_id = entity.id.into_string();
    let name = entity.name.unwrap_or_default();
    let ids: Vec<Option<String>> = entity
        .occurrence_ids
        .unwrap_or_default()
        .into_iter()
        .map(|id| id.map(RawId::into_string))
        .collect();
    let completed = entity.completed.unwrap_or_default();

    let computed = match kind {
        SlotKind::Meeting => None,
        SlotKind::Assignment | SlotKind::Chore => {
            entity.schedule.and_then(|s| s.slots).filter(|slots| !slots.is_empty())
        }
    };

    let occurrences = match (computed, entity.start_end_times) {
        (Some(raw_slots), _) => scheduled_occurrences(kind, &parent_id, &raw_slots, &ids, &completed),
        (None, Some(pairs)) => pair_occurrences(kind, &parent_id, &pairs, &ids, &completed),
        (None, None) => {
            warn!(%kind, parent_id = %parent_id, "dropping entity without occurrence times");
            return Vec::new();
        }
    };

    build_slots(kind, &parent_id, &name, occurrences)
}

fn pair_occurrences(
    kind: SlotKind,
    parent_id: &str,
    pairs: &[Value],
    ids: &[Option<String>],
    completed: &[Option<bool>],
) -> Vec<Option<Occurrence>> {
    pairs
        .iter()
        .enumerate()
        .map(|(index, value)| match RawPair::deserialize(value) {
            Ok(pair) => {
                let (start, end) = pair.bounds();
                Some(Occurrence {
                    start: start.to_string(),
                    end: end.to_string(),
                    occurrence_id: ids.get(index).cloned().flatten(),
                    completed: completed.get(index).copied().flatten(),
                })
            }
            Err(err) => {
                warn!(%kind, parent_id, index, error = %err, "dropping malformed time pair");
                None
            }
        })
        .collect()
}

fn scheduled_occurrences(
    kind: SlotKind,
    parent_id: &str,
    raw_slots: &[Value],
    ids: &[Option<String>],
    completed: &[Option<bool>],
) -> Vec<Option<Occurrence>> {
    raw_slots
        .iter()
        .enumerate()
        .map(|(index, value)| match RawScheduledSlot::deserialize(value) {
            Ok(RawScheduledSlot::Detailed { start, end, occurrence_id, completed: done }) => {
                Some(Occurrence {
                    start,
                    end,
                    occurrence_id: occurrence_id
                        .map(RawId::into_string)
                        .or_else(|| ids.get(index).cloned().flatten()),
                    completed: done.or_else(|| completed.get(index).copied().flatten()),
                })
            }
            Ok(RawScheduledSlot::Pair(start, end)) => Some(Occurrence {
                start,
                end,
                occurrence_id: ids.get(index).cloned().flatten(),
                completed: completed.get(index).copied().flatten(),
            }),
            Err(err) => {
                warn!(%kind, parent_id, index, error = %err, "dropping malformed scheduled slot");
                None
            }
        })
        .collect()
}

/// Validate occurrences into slots. The position in `occurrences` is the
/// occurrence index used when the service sent no id.
fn build_slots(
    kind: SlotKind,
    parent_id: &str,
    name: &str,
    occurrences: Vec<Option<Occurrence>>,
) -> Vec<Slot> {
    let mut taken: HashSet<String> = occurrences
        .iter()
        .flatten()
        .filter_map(|occurrence| occurrence.occurrence_id.clone())
        .collect();

    occurrences
        .into_iter()
        .enumerate()
        .filter_map(|(index, occurrence)| {
            let occurrence = occurrence?;
            let start = parse_timestamp(kind, parent_id, index, &occurrence.start)?;
            let end = parse_timestamp(kind, parent_id, index, &occurrence.end)?;
            let occurrence_id =
                occurrence.occurrence_id.unwrap_or_else(|| fallback_id(index, &mut taken));

            Slot::new(
                kind,
                parent_id,
                occurrence_id,
                name,
                start,
                end,
                occurrence.completed.unwrap_or(false),
            )
            .map_err(|err| warn!(%kind, parent_id, index, error = %err, "dropping invalid occurrence"))
            .ok()
        })
        .collect()
}

/// Id for an occurrence the service sent without one: the decimal index,
/// suffixed `.1`, `.2`, ... when the entity already uses that id.
fn fallback_id(index: usize, taken: &mut HashSet<String>) -> String {
    let mut candidate = index.to_string();
    let mut suffix = 0;
    while taken.contains(&candidate) {
        suffix += 1;
        candidate = format!("{index}.{suffix}");
    }
    taken.insert(candidate.clone());
    candidate
}

fn parse_timestamp(
    kind: SlotKind,
    parent_id: &str,
    index: usize,
    raw: &str,
) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .map_err(|err| {
            warn!(%kind, parent_id, index, value = raw, error = %err, "dropping unparsable timestamp");
        })
        .ok()
}

/// Keep the last copy of each key, then order by start.
///
/// Ties on start are broken by end and key so the output is a pure
/// function of the input set.
pub(crate) fn dedupe_and_sort(slots: Vec<Slot>) -> Vec<Slot> {
    let mut positions: HashMap<SlotKey, usize> = HashMap::with_capacity(slots.len());
    let mut unique: Vec<Slot> = Vec::with_capacity(slots.len());

    for slot in slots {
        let key = slot.key();
        if let Some(&position) = positions.get(&key) {
            debug!(key = %key, "replacing duplicate slot with later copy");
            unique[position] = slot;
        } else {
            positions.insert(key, unique.len());
            unique.push(slot);
        }
    }

    unique.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.key().cmp(&b.key()))
    });
    unique
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
