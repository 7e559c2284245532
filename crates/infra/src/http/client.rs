use std::time::Duration;

use planora_domain::PlanoraError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// Thin reqwest wrapper shared by the schedule API client.
///
/// Every request is put on the wire once. A failed fetch or mutation is
/// reported to the caller, and only an explicit new call sends it again.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start configuring a client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with the default timeout and no custom user agent.
    pub fn new() -> Result<Self, PlanoraError> {
        Self::builder().build()
    }

    /// Start a request on the underlying connection pool.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send a request exactly once.
    ///
    /// Non-2xx responses are returned as-is for the caller to classify;
    /// transport failures (timeout, refused connection) become
    /// [`PlanoraError::Network`].
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, PlanoraError> {
        let request = builder.build().map_err(into_domain)?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "response received");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "request failed");
                Err(into_domain(err))
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS), user_agent: None }
    }
}

impl HttpClientBuilder {
    /// Whole-request timeout; expiry surfaces as a network error.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client. A bad user agent or TLS setup is a config error.
    pub fn build(self) -> Result<HttpClient, PlanoraError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        Ok(HttpClient { client: builder.build().map_err(into_domain)? })
    }
}

const DEFAULT_TIMEOUT_SECS: u64 = planora_domain::constants::DEFAULT_API_TIMEOUT_SECS;

fn into_domain(err: reqwest::Error) -> PlanoraError {
    InfraError::from(err).into()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::StatusCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn hits(server: &MockServer) -> usize {
        server.received_requests().await.map_or(0, |requests| requests.len())
    }

    #[tokio::test]
    async fn server_errors_are_returned_after_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/fetch", server.uri());
        let response = client.send(client.request(Method::GET, url)).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(hits(&server).await, 1);
    }

    #[tokio::test]
    async fn mutations_reach_the_server_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = client
            .request(Method::POST, format!("{}/update", server.uri()))
            .json(&serde_json::json!({ "kind": "meeting", "id": "1" }));
        let response = client.send(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(hits(&server).await, 1);
    }

    #[tokio::test]
    async fn user_agent_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::header("user-agent", "planora-test/1.0"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::builder().user_agent("planora-test/1.0").build().unwrap();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn refused_connection_becomes_network_error() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let client = HttpClient::new().unwrap();

        let result = client.send(client.request(Method::GET, format!("http://{addr}"))).await;

        assert!(matches!(result, Err(PlanoraError::Network(_))), "got {result:?}");
    }
}
