//! Schedule service client
//!
//! Implements the core `ScheduleService` port over HTTPS:
//! - `GET  /fetch?start_time=..&end_time=..&meetings=true&assignments=true&chores=true`
//! - `POST /create`, `/update`, `/delete`, `/reschedule` with JSON bodies
//!
//! Non-2xx responses keep their body verbatim in the error.

use std::sync::Arc;

use async_trait::async_trait;
use planora_core::ScheduleService;
use planora_domain::constants::{
    ENDPOINT_CREATE, ENDPOINT_DELETE, ENDPOINT_FETCH, ENDPOINT_RESCHEDULE, ENDPOINT_UPDATE,
};
use planora_domain::{
    ApiConfig, CreateRequest, DeleteRequest, PlanoraError, RescheduleRequest, SlotKind,
    TimeWindow, UpdateRequest,
};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::auth::AccessTokenProvider;
use super::errors::ApiError;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// HTTP client for the remote schedule service
pub struct ScheduleApiClient {
    http_client: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    base_url: Url,
}

impl ScheduleApiClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL is invalid or the HTTP
    /// client cannot be created
    pub fn new(config: &ApiConfig, auth: Arc<dyn AccessTokenProvider>) -> Result<Self, ApiError> {
        let mut builder = HttpClient::builder().timeout(config.timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http_client = builder
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        Self::with_http_client(&config.base_url, auth, http_client)
    }

    /// Create a client over a preconfigured [`HttpClient`]
    pub fn with_http_client(
        base_url: &str,
        auth: Arc<dyn AccessTokenProvider>,
        http_client: HttpClient,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("Invalid API base URL {base_url:?}: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { http_client, auth, base_url })
    }

    /// Fetch every meeting, assignment and chore in `window`, as raw JSON.
    #[instrument(skip(self), fields(window = %window))]
    pub async fn fetch_window(&self, window: &TimeWindow) -> Result<Value, ApiError> {
        let token = self.auth.access_token().await?;

        let mut url = self.endpoint(ENDPOINT_FETCH)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("start_time", &window.start_param());
            query.append_pair("end_time", &window.end_param());
            for kind in SlotKind::ALL {
                query.append_pair(kind.collection_key(), "true");
            }
        }
        debug!(url = %url, "GET request");

        let request = self.http_client.request(Method::GET, url).bearer_auth(token);
        let response = self.http_client.send(request).await.map_err(ApiError::from)?;
        let body = Self::read_success(response).await?;

        let payload = parse_json(&body)?;
        info!(bytes = body.len(), "schedule window fetched");
        Ok(payload)
    }

    /// POST `body` to `path`. Returns the response text.
    #[instrument(skip(self, body), fields(path = %path))]
    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<String, ApiError> {
        let token = self.auth.access_token().await?;
        let url = self.endpoint(path)?;
        debug!(url = %url, "POST request");

        let request = self.http_client.request(Method::POST, url).bearer_auth(token).json(body);
        let response = self.http_client.send(request).await.map_err(ApiError::from)?;
        let text = Self::read_success(response).await?;

        info!(path = %path, "POST request successful");
        Ok(text)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Config(format!("Invalid endpoint path {path:?}: {e}")))
    }

    async fn read_success(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            let infra: InfraError = e.into();
            ApiError::from(PlanoraError::from(infra))
        })?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(Self::map_status_error(status, body))
        }
    }

    fn map_status_error(status: StatusCode, body: String) -> ApiError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = if body.is_empty() { status.to_string() } else { body };
            ApiError::Auth(message)
        } else {
            ApiError::Status { status: status.as_u16(), body }
        }
    }
}

fn parse_json(body: &str) -> Result<Value, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        let infra: InfraError = e.into();
        ApiError::from(PlanoraError::from(infra))
    })
}

fn to_domain(operation: &'static str, err: ApiError) -> PlanoraError {
    warn!(operation, category = ?err.category(), error = %err, "schedule API call failed");
    err.into()
}

#[async_trait]
impl ScheduleService for ScheduleApiClient {
    async fn fetch(&self, window: &TimeWindow) -> planora_domain::Result<Value> {
        self.fetch_window(window).await.map_err(|e| to_domain("fetch", e))
    }

    async fn create(&self, request: &CreateRequest) -> planora_domain::Result<()> {
        self.post(ENDPOINT_CREATE, request).await.map(drop).map_err(|e| to_domain("create", e))
    }

    async fn update(&self, request: &UpdateRequest) -> planora_domain::Result<()> {
        self.post(ENDPOINT_UPDATE, request).await.map(drop).map_err(|e| to_domain("update", e))
    }

    async fn delete(&self, request: &DeleteRequest) -> planora_domain::Result<()> {
        self.post(ENDPOINT_DELETE, request).await.map(drop).map_err(|e| to_domain("delete", e))
    }

    async fn reschedule(&self, request: &RescheduleRequest) -> planora_domain::Result<Value> {
        let body = self.post(ENDPOINT_RESCHEDULE, request).await.map_err(|e| to_domain("reschedule", e))?;
        parse_json(&body).map_err(|e| to_domain("reschedule", e))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use planora_domain::{DeleteScope, SlotKey};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::auth::{SessionTokenProvider, StaticTokenProvider};

    fn client(server: &MockServer) -> ScheduleApiClient {
        client_with(server, Arc::new(StaticTokenProvider::new("test-token")))
    }

    fn client_with(server: &MockServer, auth: Arc<dyn AccessTokenProvider>) -> ScheduleApiClient {
        ScheduleApiClient::with_http_client(&server.uri(), auth, HttpClient::new().unwrap())
            .unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 12, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_offset_timestamps_and_kinds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch"))
            .and(query_param("start_time", "2025-01-05T00:00:00+00:00"))
            .and(query_param("end_time", "2025-01-12T00:00:00+00:00"))
            .and(query_param("meetings", "true"))
            .and(query_param("assignments", "true"))
            .and(query_param("chores", "true"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "meetings": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client(&server).fetch(&window()).await.unwrap();

        assert_eq!(payload, json!({ "meetings": [] }));
    }

    #[tokio::test]
    async fn test_fetch_keeps_error_body_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(422).set_body_string("start_time: bad format"))
            .mount(&server)
            .await;

        let err = client(&server).fetch(&window()).await.unwrap_err();

        assert_eq!(
            err,
            PlanoraError::Status { status: 422, body: "start_time: bad format".into() }
        );
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client(&server).fetch(&window()).await.unwrap_err();

        assert!(matches!(err, PlanoraError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let err = client(&server).fetch(&window()).await.unwrap_err();

        assert_eq!(err, PlanoraError::Auth("token expired".into()));
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let client = client_with(&server, Arc::new(SessionTokenProvider::new()));
        let err = client.fetch(&window()).await.unwrap_err();

        assert!(matches!(err, PlanoraError::MissingCredential(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/delete"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_json(json!({
                "kind": "chore",
                "id": "9",
                "occurrence_id": "2",
                "future": true,
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let key = SlotKey::new(SlotKind::Chore, "9", "2");
        client(&server).delete(&DeleteRequest::new(&key, DeleteScope::ThisAndFuture)).await.unwrap();
    }

    #[tokio::test]
    async fn test_mutations_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update"))
            .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
            .expect(1)
            .mount(&server)
            .await;

        let key = SlotKey::new(SlotKind::Meeting, "1", "a");
        let request = UpdateRequest::for_slot(&key).unwrap().rename("Sync");
        let err = client(&server).update(&request).await.unwrap_err();

        assert_eq!(err, PlanoraError::Status { status: 503, body: "try later".into() });
    }

    #[tokio::test]
    async fn test_fetch_is_not_retried_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;
        let config = ApiConfig { base_url: server.uri(), ..ApiConfig::default() };
        let api = ScheduleApiClient::new(&config, Arc::new(StaticTokenProvider::new("t"))).unwrap();

        let err = api.fetch(&window()).await.unwrap_err();

        assert_eq!(err, PlanoraError::Status { status: 503, body: "busy".into() });
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reschedule_returns_response_json() {
        let server = MockServer::start().await;
        let proposal = json!({ "schedule": { "slots": [
            { "start": "2025-01-06T10:00:00+00:00", "end": "2025-01-06T11:00:00+00:00" }
        ]}});
        Mock::given(method("POST"))
            .and(path("/reschedule"))
            .respond_with(ResponseTemplate::new(200).set_body_json(proposal.clone()))
            .mount(&server)
            .await;

        let key = SlotKey::new(SlotKind::Assignment, "7", "0");
        let request = RescheduleRequest::new(&key, 60, window(), false).unwrap();
        let body = client(&server).reschedule(&request).await.unwrap();

        assert_eq!(body, proposal);
    }

    #[tokio::test]
    async fn test_base_url_path_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/fetch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let http = HttpClient::new().unwrap();
        let client = ScheduleApiClient::with_http_client(
            &format!("{}/v1", server.uri()),
            Arc::new(StaticTokenProvider::new("t")),
            http,
        )
        .unwrap();

        client.fetch(&window()).await.unwrap();
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = ScheduleApiClient::new(
            &ApiConfig { base_url: "not a url".into(), ..ApiConfig::default() },
            Arc::new(StaticTokenProvider::new("t")),
        );
        assert!(matches!(result, Err(ApiError::Config(_))));
    }
}
