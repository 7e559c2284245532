//! Mutation coordinator
//!
//! Every user edit goes through here: submit to the service, then refetch the
//! cached window, and only then report success. A failed submit leaves the
//! cache exactly as it was.
//!
//! Each mutation runs on its own task. A view that is torn down mid-edit
//! drops its future, but the submit and the refetch still complete and the
//! result lands in the shared cache.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use planora_domain::{
    impl_domain_status_conversions, CreateRequest, DeleteRequest, PlanoraError, RescheduleProposal,
    RescheduleRequest, UpdateRequest,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument, warn};

use super::normalizer::normalize_schedule;
use super::ports::ScheduleService;
use super::range_cache::{CacheSnapshot, RangeCache};

/// Step of the mutation state machine.
///
/// A single mutation moves `Submitting → Refreshing → Succeeded → Idle`, or
/// ends `Failed → Idle` when the submit or the refresh fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationPhase {
    #[default]
    Idle,
    Submitting,
    Refreshing,
    Succeeded,
    Failed,
}

impl_domain_status_conversions!(MutationPhase {
    Idle => "idle",
    Submitting => "submitting",
    Refreshing => "refreshing",
    Succeeded => "succeeded",
    Failed => "failed",
});

impl MutationPhase {
    /// True while the mutation still owes the caller an answer.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Submitting | Self::Refreshing)
    }
}

/// One phase transition of one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MutationEvent {
    /// Per-coordinator sequence number, unique for each submitted mutation.
    pub id: u64,
    pub operation: &'static str,
    pub phase: MutationPhase,
}

/// Why a mutation did not report success.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    /// The service did not accept the change. The cache is untouched.
    #[error("mutation rejected: {0}")]
    Rejected(PlanoraError),

    /// The service accepted the change but the cache could not be refreshed.
    /// The cache still shows the pre-mutation state.
    #[error("mutation applied but refresh failed: {0}")]
    RefreshFailed(PlanoraError),
}

impl MutationError {
    /// The underlying error, whichever stage failed.
    pub fn cause(&self) -> &PlanoraError {
        match self {
            Self::Rejected(err) | Self::RefreshFailed(err) => err,
        }
    }

    /// Whether the remote side holds the change.
    pub fn was_applied(&self) -> bool {
        matches!(self, Self::RefreshFailed(_))
    }
}

impl From<MutationError> for PlanoraError {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::Rejected(cause) | MutationError::RefreshFailed(cause) => cause,
        }
    }
}

/// Submits edits and keeps the shared cache consistent with them.
///
/// Cloning yields another handle over the same phase and event feeds.
#[derive(Clone)]
pub struct MutationCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    service: Arc<dyn ScheduleService>,
    cache: RangeCache,
    phase: watch::Sender<MutationPhase>,
    events: broadcast::Sender<MutationEvent>,
    in_flight: Mutex<InFlight>,
    next_id: AtomicU64,
}

/// Mutations currently between submit and report, by phase.
#[derive(Debug, Default)]
struct InFlight {
    submitting: usize,
    refreshing: usize,
}

impl InFlight {
    fn aggregate(&self) -> MutationPhase {
        if self.submitting > 0 {
            MutationPhase::Submitting
        } else if self.refreshing > 0 {
            MutationPhase::Refreshing
        } else {
            MutationPhase::Idle
        }
    }
}

const EVENT_CAPACITY: usize = 64;

impl MutationCoordinator {
    /// Coordinator that refreshes `cache` after every accepted mutation.
    pub fn new(service: Arc<dyn ScheduleService>, cache: RangeCache) -> Self {
        let (phase, _) = watch::channel(MutationPhase::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(CoordinatorInner {
                service,
                cache,
                phase,
                events,
                in_flight: Mutex::new(InFlight::default()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Busy state across all mutations: `Submitting` while any submit is
    /// outstanding, else `Refreshing` while any refresh is, else `Idle`.
    pub fn phase(&self) -> MutationPhase {
        *self.inner.phase.borrow()
    }

    /// Watch [`MutationCoordinator::phase`].
    pub fn subscribe_phase(&self) -> watch::Receiver<MutationPhase> {
        self.inner.phase.subscribe()
    }

    /// Every transition of every mutation submitted after this call, in
    /// order. Each mutation ends with an `Idle` event.
    pub fn subscribe_events(&self) -> broadcast::Receiver<MutationEvent> {
        self.inner.events.subscribe()
    }

    /// Create a new meeting, assignment or chore.
    pub async fn create(&self, request: CreateRequest) -> Result<CacheSnapshot, MutationError> {
        let service = Arc::clone(&self.inner.service);
        let label = format!("{}/new", request.kind);
        let (_, snapshot) =
            self.run("create", label, async move { service.create(&request).await }).await?;
        Ok(snapshot)
    }

    /// Rename, retime or (for assignments) complete one occurrence.
    pub async fn update(&self, request: UpdateRequest) -> Result<CacheSnapshot, MutationError> {
        if request.is_noop() {
            return Err(MutationError::Rejected(PlanoraError::InvalidInput(format!(
                "{}: update changes nothing",
                request.key()
            ))));
        }

        let service = Arc::clone(&self.inner.service);
        let label = request.key().to_string();
        let (_, snapshot) =
            self.run("update", label, async move { service.update(&request).await }).await?;
        Ok(snapshot)
    }

    /// Delete one occurrence, or it and every later one in the series.
    pub async fn delete(&self, request: DeleteRequest) -> Result<CacheSnapshot, MutationError> {
        let service = Arc::clone(&self.inner.service);
        let label = request.key().to_string();
        let (_, snapshot) =
            self.run("delete", label, async move { service.delete(&request).await }).await?;
        Ok(snapshot)
    }

    /// Ask for a new schedule of an assignment or chore occurrence.
    ///
    /// The returned proposal is normalized like fetched slots; the parent's
    /// name is taken from the cache when it holds the occurrence.
    pub async fn reschedule(
        &self,
        request: RescheduleRequest,
    ) -> Result<RescheduleProposal, MutationError> {
        let key = request.key();
        let name = self.inner.cache.snapshot().find(&key).map(|slot| slot.name.clone()).unwrap_or_default();

        let service = Arc::clone(&self.inner.service);
        let (proposal, _) = self
            .run("reschedule", key.to_string(), async move {
                let raw = service.reschedule(&request).await?;
                let slots = normalize_schedule(request.kind, &request.parent_id, &name, &raw)?;
                Ok(RescheduleProposal { slots, raw })
            })
            .await?;
        Ok(proposal)
    }

    async fn run<T, F>(
        &self,
        operation: &'static str,
        target: String,
        submit: F,
    ) -> Result<(T, CacheSnapshot), MutationError>
    where
        T: Send + 'static,
        F: Future<Output = planora_domain::Result<T>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run(operation, target, submit).await }).await.map_err(|err| {
            MutationError::Rejected(PlanoraError::Internal(format!("{operation} task failed: {err}")))
        })?
    }
}

impl CoordinatorInner {
    #[instrument(skip_all, fields(operation = operation, target = %target))]
    async fn run<T, F>(
        &self,
        operation: &'static str,
        target: String,
        submit: F,
    ) -> Result<(T, CacheSnapshot), MutationError>
    where
        F: Future<Output = planora_domain::Result<T>>,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.transition(id, operation, None, MutationPhase::Submitting);

        let outcome = match submit.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, label = err.error_label(), "mutation rejected, cache untouched");
                self.finish(id, operation, MutationPhase::Submitting, MutationPhase::Failed);
                return Err(MutationError::Rejected(err));
            }
        };

        self.transition(id, operation, Some(MutationPhase::Submitting), MutationPhase::Refreshing);
        match self.cache.refetch().await {
            Ok(snapshot) => {
                info!(revision = snapshot.revision, "mutation applied");
                self.finish(id, operation, MutationPhase::Refreshing, MutationPhase::Succeeded);
                Ok((outcome, snapshot))
            }
            Err(err) => {
                warn!(error = %err, "mutation applied remotely but refresh failed");
                self.finish(id, operation, MutationPhase::Refreshing, MutationPhase::Failed);
                Err(MutationError::RefreshFailed(err))
            }
        }
    }

    /// Move one mutation from `from` (if any) to the in-flight phase `to`.
    fn transition(
        &self,
        id: u64,
        operation: &'static str,
        from: Option<MutationPhase>,
        to: MutationPhase,
    ) {
        let aggregate = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(from) = from {
                in_flight.leave(from);
            }
            in_flight.enter(to);
            in_flight.aggregate()
        };
        self.phase.send_replace(aggregate);
        self.emit(id, operation, to);
    }

    /// Report the outcome of one mutation, then return it to `Idle`.
    fn finish(&self, id: u64, operation: &'static str, from: MutationPhase, outcome: MutationPhase) {
        let aggregate = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            in_flight.leave(from);
            in_flight.aggregate()
        };
        self.emit(id, operation, outcome);
        self.emit(id, operation, MutationPhase::Idle);
        self.phase.send_replace(aggregate);
    }

    fn emit(&self, id: u64, operation: &'static str, phase: MutationPhase) {
        // No receivers is fine.
        let _ = self.events.send(MutationEvent { id, operation, phase });
    }
}

impl InFlight {
    fn enter(&mut self, phase: MutationPhase) {
        match phase {
            MutationPhase::Submitting => self.submitting += 1,
            MutationPhase::Refreshing => self.refreshing += 1,
            _ => {}
        }
    }

    fn leave(&mut self, phase: MutationPhase) {
        match phase {
            MutationPhase::Submitting => self.submitting = self.submitting.saturating_sub(1),
            MutationPhase::Refreshing => self.refreshing = self.refreshing.saturating_sub(1),
            _ => {}
        }
    }
}
