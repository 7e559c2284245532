//! Schedule session
//!
//! One session per signed-in user. It owns the range cache and the mutation
//! coordinator that every view shares; ending the session drops both.

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, TimeZone};
use planora_domain::{CacheConfig, Result, TimeWindow};
use tracing::info;

use super::mutations::MutationCoordinator;
use super::ports::ScheduleService;
use super::projections::day_window;
use super::range_cache::{CacheSnapshot, RangeCache};

pub struct ScheduleSession {
    cache: RangeCache,
    mutations: MutationCoordinator,
    config: CacheConfig,
}

impl ScheduleSession {
    /// Fresh session with an empty cache over `service`.
    pub fn new(service: Arc<dyn ScheduleService>, config: CacheConfig) -> Self {
        let cache = RangeCache::new(Arc::clone(&service));
        let mutations = MutationCoordinator::new(service, cache.clone());
        Self { cache, mutations, config }
    }

    /// The shared cache every view reads.
    pub fn cache(&self) -> &RangeCache {
        &self.cache
    }

    /// The coordinator every edit goes through.
    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    /// Whole local days from `lookback` days before `today` through
    /// `lookahead` days after it.
    pub fn default_window<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz) -> Result<TimeWindow> {
        let first = today - Duration::days(i64::from(self.config.default_lookback_days));
        let last = today + Duration::days(i64::from(self.config.default_lookahead_days));
        Ok(day_window(first, tz)?.union(&day_window(last, tz)?))
    }

    /// Materialize the default window around today, local time.
    pub async fn prime(&self) -> Result<CacheSnapshot> {
        let window = self.default_window(Local::now().date_naive(), &Local)?;
        self.cache.ensure_coverage(window).await
    }

    /// Tear the session down. In-flight cache updates still finish on their
    /// own tasks; nothing observes them afterwards.
    pub fn end(self) {
        let metrics = self.cache.metrics();
        info!(
            hits = metrics.get_hits(),
            misses = metrics.get_misses(),
            refetches = metrics.get_refetches(),
            failures = metrics.get_failures(),
            hit_rate = metrics.get_hit_rate(),
            "schedule session ended"
        );
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use planora_domain::{CreateRequest, DeleteRequest, RescheduleRequest, UpdateRequest};
    use serde_json::{json, Value};

    use super::*;

    struct EmptyService;

    #[async_trait]
    impl ScheduleService for EmptyService {
        async fn fetch(&self, _window: &TimeWindow) -> Result<Value> {
            Ok(json!({ "meetings": [], "assignments": [], "chores": [] }))
        }

        async fn create(&self, _request: &CreateRequest) -> Result<()> {
            Ok(())
        }

        async fn update(&self, _request: &UpdateRequest) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _request: &DeleteRequest) -> Result<()> {
            Ok(())
        }

        async fn reschedule(&self, _request: &RescheduleRequest) -> Result<Value> {
            Ok(json!({}))
        }
    }

    #[test]
    fn default_window_spans_whole_days() {
        let session = ScheduleSession::new(
            Arc::new(EmptyService),
            CacheConfig { default_lookback_days: 2, default_lookahead_days: 3 },
        );
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        let window = session.default_window(today, &Utc).unwrap();

        assert_eq!(window.start_param(), "2025-01-08T00:00:00+00:00");
        assert_eq!(window.end_param(), "2025-01-14T00:00:00+00:00");
    }

    #[tokio::test]
    async fn prime_materializes_and_end_releases() {
        let session = ScheduleSession::new(Arc::new(EmptyService), CacheConfig::default());

        let snapshot = session.prime().await.unwrap();
        assert!(snapshot.is_materialized());
        assert_eq!(session.cache().metrics().get_misses(), 1);

        // A second prime is a coverage hit.
        session.prime().await.unwrap();
        assert_eq!(session.cache().metrics().get_hits(), 1);

        session.end();
    }
}
