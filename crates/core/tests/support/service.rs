use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use planora_core::ScheduleService;
use planora_domain::types::wire_time;
use planora_domain::{
    CreateRequest, DeleteRequest, PlanoraError, RescheduleRequest, Result as DomainResult, Slot,
    SlotKind, TimeWindow, UpdateRequest,
};
use serde_json::{json, Map, Value};
use tokio::sync::watch;

/// In-memory `ScheduleService`.
///
/// Holds the authoritative slots, renders them in the wire shapes on fetch,
/// and applies mutations to them. Fetches can be paused to hold a cache
/// update in flight, and the next fetch or mutation can be made to fail.
pub struct FakeScheduleService {
    state: Mutex<FakeState>,
    paused: watch::Sender<bool>,
    /// Fetches currently held at the pause gate.
    held: watch::Sender<usize>,
}

#[derive(Default)]
struct FakeState {
    slots: Vec<Slot>,
    fetches: Vec<TimeWindow>,
    mutations: Vec<String>,
    next_fetch_error: Option<PlanoraError>,
    next_mutation_error: Option<PlanoraError>,
    next_parent_id: u64,
}

impl FakeScheduleService {
    pub fn new(slots: Vec<Slot>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState { slots, next_parent_id: 1000, ..FakeState::default() }),
            paused: watch::channel(false).0,
            held: watch::channel(0).0,
        })
    }

    /// Hold every fetch until [`Self::resume_fetches`].
    pub fn pause_fetches(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume_fetches(&self) {
        self.paused.send_replace(false);
    }

    /// Resolves once a fetch is held at the pause gate.
    pub async fn wait_for_fetch(&self) {
        self.held.subscribe().wait_for(|held| *held > 0).await.unwrap();
    }

    pub fn fail_next_fetch(&self, err: PlanoraError) {
        self.state.lock().unwrap().next_fetch_error = Some(err);
    }

    pub fn fail_next_mutation(&self, err: PlanoraError) {
        self.state.lock().unwrap().next_mutation_error = Some(err);
    }

    pub fn fetches(&self) -> Vec<TimeWindow> {
        self.state.lock().unwrap().fetches.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches.len()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn stored(&self) -> Vec<Slot> {
        self.state.lock().unwrap().slots.clone()
    }

    fn begin_mutation(&self, label: String) -> DomainResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.mutations.push(label);
        match state.next_mutation_error.take() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

fn not_found(what: impl std::fmt::Display) -> PlanoraError {
    PlanoraError::Status { status: 404, body: format!("{what} not found") }
}

/// Render slots grouped into parent entities, in the shapes the real
/// service uses: pairs plus `occurrence_ids` for meetings, a computed
/// schedule for assignments and chores.
fn render(slots: &[&Slot]) -> Value {
    let mut payload = Map::new();
    for kind in SlotKind::ALL {
        let mut entities: Vec<(String, Vec<&Slot>)> = Vec::new();
        for slot in slots.iter().filter(|slot| slot.kind == kind) {
            match entities.iter_mut().find(|(parent, _)| *parent == slot.parent_id) {
                Some((_, group)) => group.push(slot),
                None => entities.push((slot.parent_id.clone(), vec![slot])),
            }
        }

        let rendered: Vec<Value> = entities
            .into_iter()
            .map(|(parent, group)| {
                let name = group[0].name.clone();
                if kind == SlotKind::Meeting {
                    json!({
                        "id": parent,
                        "name": name,
                        "start_end_times": group.iter().map(|s| [wire_time::format(&s.start), wire_time::format(&s.end)]).collect::<Vec<_>>(),
                        "occurrence_ids": group.iter().map(|s| s.occurrence_id.clone()).collect::<Vec<_>>(),
                    })
                } else {
                    json!({
                        "id": parent,
                        "name": name,
                        "schedule": { "slots": group.iter().map(|s| json!({
                            "start": wire_time::format(&s.start),
                            "end": wire_time::format(&s.end),
                            "occurrence_id": s.occurrence_id,
                            "completed": s.completed.unwrap_or(false),
                        })).collect::<Vec<_>>() },
                    })
                }
            })
            .collect();
        payload.insert(kind.collection_key().to_string(), Value::Array(rendered));
    }
    Value::Object(payload)
}

#[async_trait]
impl ScheduleService for FakeScheduleService {
    async fn fetch(&self, window: &TimeWindow) -> DomainResult<Value> {
        self.state.lock().unwrap().fetches.push(*window);

        let mut paused = self.paused.subscribe();
        let is_paused = *paused.borrow_and_update();
        if is_paused {
            self.held.send_modify(|held| *held += 1);
            paused.wait_for(|paused| !*paused).await.unwrap();
            self.held.send_modify(|held| *held -= 1);
        }

        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.next_fetch_error.take() {
            return Err(err);
        }
        let visible: Vec<&Slot> = state.slots.iter().filter(|slot| slot.overlaps(window)).collect();
        Ok(render(&visible))
    }

    async fn create(&self, request: &CreateRequest) -> DomainResult<()> {
        let mut state = self.begin_mutation(format!("create {}", request.name))?;
        let parent = state.next_parent_id.to_string();
        state.next_parent_id += 1;

        for (index, occurrence) in request.occurrences.iter().enumerate() {
            let slot = Slot::new(
                request.kind,
                parent.clone(),
                index.to_string(),
                request.name.clone(),
                occurrence.start().fixed_offset(),
                occurrence.end().fixed_offset(),
                false,
            )?;
            state.slots.push(slot);
        }
        Ok(())
    }

    async fn update(&self, request: &UpdateRequest) -> DomainResult<()> {
        let key = request.key();
        let mut state = self.begin_mutation(format!("update {key}"))?;
        if !state.slots.iter().any(|slot| slot.matches(&key)) {
            return Err(not_found(&key));
        }

        for slot in state.slots.iter_mut() {
            if slot.kind != key.kind || slot.parent_id != key.parent_id {
                continue;
            }
            if let Some(name) = &request.name {
                slot.name = name.clone();
            }
            if slot.occurrence_id == key.occurrence_id {
                if let (Some(start), Some(end)) = (request.start, request.end) {
                    slot.start = start;
                    slot.end = end;
                }
                if request.completed.is_some() {
                    slot.completed = request.completed;
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, request: &DeleteRequest) -> DomainResult<()> {
        let key = request.key();
        let mut state = self.begin_mutation(format!("delete {key}"))?;
        let target = state
            .slots
            .iter()
            .find(|slot| slot.matches(&key))
            .map(|slot| slot.start)
            .ok_or_else(|| not_found(&key))?;

        state.slots.retain(|slot| {
            let same_series = slot.kind == key.kind && slot.parent_id == key.parent_id;
            if request.future {
                !(same_series && slot.start >= target)
            } else {
                !slot.matches(&key)
            }
        });
        Ok(())
    }

    async fn reschedule(&self, request: &RescheduleRequest) -> DomainResult<Value> {
        let key = request.key();
        let state = self.begin_mutation(format!("reschedule {key}"))?;
        if !state.slots.iter().any(|slot| slot.matches(&key)) {
            return Err(not_found(&key));
        }

        let start = request.window_start;
        let end = start + Duration::minutes(i64::from(request.effort_minutes));
        Ok(json!({ "schedule": { "slots": [{
            "start": wire_time::format(&start),
            "end": wire_time::format(&end),
            "occurrence_id": key.occurrence_id,
            "completed": false,
        }]}}))
    }
}
