//! Range cache
//!
//! Owns the currently materialized window and its slots. Views ask for
//! coverage of the window they render; the cache fetches only when the
//! request is not already a subset of what it holds, and then fetches the
//! union of old and new windows so the result is one self-consistent answer
//! from the service.
//!
//! ## Ordering
//! - At most one fetch-and-apply is in flight (`gate`).
//! - Requests that arrive while a fetch is in flight are merged into a
//!   pending union; whichever operation next holds the gate fetches all of
//!   it, and later waiters find themselves covered.
//! - Every fetch-and-apply runs on its own task, so dropping the caller's
//!   future (an unmounted view) does not abort the cache update.
//!
//! ## State
//! `(window, slots)` is replaced as a whole by publishing a new
//! [`CacheSnapshot`]; a failed fetch publishes nothing.

use std::sync::{Arc, Mutex, PoisonError};

use planora_domain::{PlanoraError, Result, Slot, SlotKey, TimeWindow};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::metrics::CacheMetrics;
use super::normalizer::normalize_payload;
use super::ports::ScheduleService;

/// Immutable view of the cache at one revision.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    /// `None` until something has been materialized.
    pub window: Option<TimeWindow>,
    /// Start-ascending, unique by key, restricted to `window`.
    pub slots: Arc<[Slot]>,
    /// Incremented on every applied fetch.
    pub revision: u64,
}

impl Default for CacheSnapshot {
    fn default() -> Self {
        Self { window: None, slots: Arc::from(Vec::new()), revision: 0 }
    }
}

impl CacheSnapshot {
    /// Whether any fetch has been applied yet.
    pub fn is_materialized(&self) -> bool {
        self.window.is_some()
    }

    /// Whether `requested` lies inside the cached window.
    pub fn covers(&self, requested: &TimeWindow) -> bool {
        self.window.is_some_and(|window| window.covers(requested))
    }

    /// Slots overlapping `window`, in start order.
    pub fn slots_in<'a>(&'a self, window: &'a TimeWindow) -> impl Iterator<Item = &'a Slot> + 'a {
        self.slots.iter().filter(move |slot| slot.overlaps(window))
    }

    /// Slot with identity `key`, if cached.
    pub fn find(&self, key: &SlotKey) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.matches(key))
    }

    /// Whether a slot with identity `key` is cached.
    pub fn contains(&self, key: &SlotKey) -> bool {
        self.find(key).is_some()
    }
}

/// Session-scoped schedule cache shared by every view.
///
/// Cloning yields another handle to the same cache.
#[derive(Clone)]
pub struct RangeCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    service: Arc<dyn ScheduleService>,
    gate: tokio::sync::Mutex<()>,
    pending: Mutex<Option<TimeWindow>>,
    state: watch::Sender<CacheSnapshot>,
    metrics: CacheMetrics,
}

impl RangeCache {
    /// Create an empty cache backed by `service`.
    pub fn new(service: Arc<dyn ScheduleService>) -> Self {
        let (state, _) = watch::channel(CacheSnapshot::default());
        Self {
            inner: Arc::new(CacheInner {
                service,
                gate: tokio::sync::Mutex::new(()),
                pending: Mutex::new(None),
                state,
                metrics: CacheMetrics::new(),
            }),
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.inner.current()
    }

    /// Receive every snapshot the cache applies from now on.
    ///
    /// Dropping the receiver only stops observation.
    pub fn subscribe(&self) -> watch::Receiver<CacheSnapshot> {
        self.inner.state.subscribe()
    }

    /// Hit, miss and failure counters for this cache.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.inner.metrics
    }

    /// Guarantee that the cache window is a superset of `requested`.
    ///
    /// - covered already: returns immediately, no network call
    /// - empty cache: fetches exactly `requested` (plus anything queued)
    /// - otherwise: fetches the union of the current window and `requested`
    ///
    /// # Errors
    /// The fetch error, with the cache left as it was.
    pub async fn ensure_coverage(&self, requested: TimeWindow) -> Result<CacheSnapshot> {
        let current = self.inner.current();
        if current.covers(&requested) {
            self.inner.metrics.record_hit();
            debug!(window = %requested, "coverage hit");
            return Ok(current);
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.ensure_coverage(requested).await })
            .await
            .map_err(|err| PlanoraError::Internal(format!("cache update task failed: {err}")))?
    }

    /// Re-fetch the current window and replace its slots.
    ///
    /// No-op when nothing is materialized.
    pub async fn refetch(&self) -> Result<CacheSnapshot> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.refetch().await })
            .await
            .map_err(|err| PlanoraError::Internal(format!("cache refetch task failed: {err}")))?
    }
}

impl CacheInner {
    fn current(&self) -> CacheSnapshot {
        self.state.borrow().clone()
    }

    fn enqueue(&self, requested: TimeWindow) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = Some(match *pending {
            Some(queued) => queued.union(&requested),
            None => requested,
        });
    }

    fn take_pending(&self) -> Option<TimeWindow> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    #[instrument(skip_all, fields(requested = %requested))]
    async fn ensure_coverage(&self, requested: TimeWindow) -> Result<CacheSnapshot> {
        self.enqueue(requested);
        let _guard = self.gate.lock().await;

        let current = self.current();
        if current.covers(&requested) {
            self.metrics.record_hit();
            debug!("covered by a queued fetch");
            return Ok(current);
        }

        let queued = self.take_pending().map_or(requested, |queued| queued.union(&requested));
        let target = match current.window {
            Some(window) => window.union(&queued),
            None => queued,
        };
        self.metrics.record_miss();
        debug!(target = %target, previous = ?current.window.map(|w| w.to_string()), "fetching union window");

        let slots = self.fetch_slots(&target).await?;
        Ok(self.apply(target, slots))
    }

    #[instrument(skip(self))]
    async fn refetch(&self) -> Result<CacheSnapshot> {
        let _guard = self.gate.lock().await;

        let current = self.current();
        let Some(window) = current.window else {
            debug!("nothing materialized, skipping refetch");
            return Ok(current);
        };

        self.metrics.record_refetch();
        let slots = self.fetch_slots(&window).await?;
        Ok(self.apply(window, slots))
    }

    async fn fetch_slots(&self, window: &TimeWindow) -> Result<Vec<Slot>> {
        let fetched = match self.service.fetch(window).await {
            Ok(payload) => normalize_payload(&payload),
            Err(err) => Err(err),
        };

        fetched.map_err(|err| {
            self.metrics.record_failure();
            warn!(window = %window, error = %err, label = err.error_label(), "schedule fetch failed, keeping previous state");
            err
        })
    }

    fn apply(&self, window: TimeWindow, slots: Vec<Slot>) -> CacheSnapshot {
        let fetched = slots.len();
        let slots: Vec<Slot> = slots.into_iter().filter(|slot| slot.overlaps(&window)).collect();
        if slots.len() != fetched {
            debug!(dropped = fetched - slots.len(), "discarded slots outside the fetched window");
        }

        let revision = self.state.borrow().revision + 1;
        let snapshot = CacheSnapshot { window: Some(window), slots: slots.into(), revision };
        self.state.send_replace(snapshot.clone());

        info!(window = %window, slots = snapshot.slots.len(), revision, "schedule cache updated");
        snapshot
    }
}
