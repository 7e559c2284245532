//! Port interface for the remote schedule service

use async_trait::async_trait;
use planora_domain::{
    CreateRequest, DeleteRequest, RescheduleRequest, Result, TimeWindow, UpdateRequest,
};

/// Client-side contract with the remote schedule service.
///
/// Implementations attach credentials and map transport failures into
/// `PlanoraError`. Requests are sent at most once; no call retries.
#[async_trait]
pub trait ScheduleService: Send + Sync {
    /// Fetch meetings, assignments and chores for `window`.
    ///
    /// Returns the JSON body as received; normalization happens in the
    /// cache. A body that is not JSON is `MalformedPayload`.
    async fn fetch(&self, window: &TimeWindow) -> Result<serde_json::Value>;

    async fn create(&self, request: &CreateRequest) -> Result<()>;

    async fn update(&self, request: &UpdateRequest) -> Result<()>;

    async fn delete(&self, request: &DeleteRequest) -> Result<()>;

    /// Returns the candidate schedule body for the user to review.
    async fn reschedule(&self, request: &RescheduleRequest) -> Result<serde_json::Value>;
}
