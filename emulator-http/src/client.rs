//! HTTP client implementation

use crate::config::HttpConfig;
use crate::errors::HttpError;
use async_trait::async_trait;
use emulator_core::{
    AggregatedResponse, CalledServiceRef, DownstreamCall, DownstreamClient, EndpointRequest,
    Protocol, TransportError, TransportReply,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, StatusCode,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Status reported when a breaker rejects or times out an HTTP call
pub const SERVICE_UNAVAILABLE: &str = "Service unavailable";

/// Status reported when an unprotected HTTP call exceeds its deadline
pub const REQUEST_TIMED_OUT: &str = "Request timed out";

/// Downstream client for HTTP routes, sharing one connection pool
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl HttpClient {
    /// Create a new client with specific configuration
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HttpClient with forward timeout: {:?}",
            config.forward_timeout
        );

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .no_proxy()
            .build()
            .map_err(|e| HttpError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// `http://{service}[:{port}]/{endpoint}`
    pub fn url(target: &CalledServiceRef) -> String {
        format!("http://{}/{}", target.authority(), target.endpoint)
    }

    /// `"{code} {reason}"`, e.g. `"200 OK"`
    pub fn status_text(status: StatusCode) -> String {
        match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        }
    }

    fn headers(call: &DownstreamCall) -> Result<HeaderMap, HttpError> {
        let mut headers = HeaderMap::new();

        for (name, value) in &call.headers {
            let name = HeaderName::from_str(name)
                .map_err(|_| HttpError::InvalidHeaderName(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeaderValue(name.to_string()))?;
            headers.append(name, value);
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn post(&self, call: &DownstreamCall) -> Result<TransportReply, HttpError> {
        let url = Self::url(&call.target);
        debug!("POST {} on behalf of {}", url, call.source_endpoint);

        let body = serde_json::to_vec(&EndpointRequest {
            payload: call.payload.clone(),
        })?;

        let response = self
            .client
            .post(&url)
            .headers(Self::headers(call)?)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        // Every emulated endpoint answers with an aggregated response, whatever the status
        let body: AggregatedResponse = serde_json::from_slice(&bytes)?;

        debug!("{} answered {}", url, status);
        Ok(TransportReply {
            status: Self::status_text(status),
            body,
        })
    }
}

#[async_trait]
impl DownstreamClient for HttpClient {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    fn default_timeout(&self) -> Duration {
        self.config.forward_timeout
    }

    async fn send(&self, call: &DownstreamCall) -> Result<TransportReply, TransportError> {
        self.post(call).await.map_err(TransportError::from)
    }

    fn unavailable(&self) -> TransportError {
        TransportError::new(SERVICE_UNAVAILABLE)
    }

    fn deadline_exceeded(&self) -> TransportError {
        TransportError::new(REQUEST_TIMED_OUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap as AxumHeaders, routing::post, Json, Router};
    use emulator_core::{NetworkTaskResult, TaskResponses, TaskResult};

    async fn serve(router: Router) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        port
    }

    fn call(port: u16, endpoint: &str) -> DownstreamCall {
        DownstreamCall {
            source_endpoint: "ep1".to_string(),
            target: CalledServiceRef::new("127.0.0.1", endpoint, Protocol::Http).with_port(port),
            payload: "abc".to_string(),
            headers: vec![("X-Request-Id".to_string(), "req-7".to_string())],
        }
    }

    #[test]
    fn test_url_omits_missing_port() {
        let target = CalledServiceRef::new("svcB", "ep1", Protocol::Http);
        assert_eq!(HttpClient::url(&target), "http://svcB/ep1");
        assert_eq!(HttpClient::url(&target.with_port(8080)), "http://svcB:8080/ep1");
    }

    #[test]
    fn test_status_text() {
        assert_eq!(HttpClient::status_text(StatusCode::OK), "200 OK");
        assert_eq!(HttpClient::status_text(StatusCode::NOT_FOUND), "404 Not Found");
    }

    #[tokio::test]
    async fn test_post_decodes_aggregated_response() {
        let router = Router::new().route(
            "/ep2",
            post(|headers: AxumHeaders, Json(request): Json<EndpointRequest>| async move {
                let mut tasks = TaskResponses::default();
                let request_id = headers
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                tasks.apply(TaskResult::Network(NetworkTaskResult::new(
                    format!("svcB/ep2#{}", request_id),
                    request.payload,
                )));
                Json(AggregatedResponse::new("ep2", tasks))
            }),
        );
        let port = serve(router).await;

        let client = HttpClient::with_config(HttpConfig::default()).unwrap();
        let reply = client.send(&call(port, "ep2")).await.unwrap();

        assert_eq!(reply.status, "200 OK");
        let network = reply.body.task_results.unwrap().network_task.unwrap();
        assert_eq!(network.services_visited, vec!["svcB/ep2#req-7"]);
        assert_eq!(network.payload, "abc");
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_body() {
        let router = Router::new().fallback(|| async {
            (
                axum::http::StatusCode::NOT_FOUND,
                Json(AggregatedResponse::not_found("missing")),
            )
        });
        let port = serve(router).await;

        let client = HttpClient::with_config(HttpConfig::default()).unwrap();
        let reply = client.send(&call(port, "missing")).await.unwrap();

        assert_eq!(reply.status, "404 Not Found");
        assert!(reply.body.error_message.is_some());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = HttpClient::with_config(HttpConfig::default()).unwrap();
        let err = client.send(&call(port, "ep1")).await.unwrap_err();
        assert!(err.status.starts_with("Network error"));
    }

    #[test]
    fn test_synthetic_errors() {
        let client = HttpClient::with_config(HttpConfig::default()).unwrap();
        assert_eq!(client.unavailable().status, "Service unavailable");
        assert_eq!(client.deadline_exceeded().status, "Request timed out");
    }
}
