//! HTTP client for webhook delivery attempts.
//!
//! Performs one POST per call with a fixed request timeout; the retry loop
//! lives in the dispatcher. Transport errors are categorized for the retry
//! contract and response bodies are captured best-effort.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use hookwire_core::EventKind;

use crate::error::{DeliveryError, Result};

/// Header carrying the event wire name.
pub const HEADER_EVENT: &str = "X-Webhook-Event";
/// Header carrying the envelope timestamp.
pub const HEADER_TIMESTAMP: &str = "X-Webhook-Timestamp";
/// Header carrying the zero-based attempt retry count.
pub const HEADER_RETRY_COUNT: &str = "X-Webhook-Retry-Count";
/// Header carrying the HMAC payload signature.
pub const HEADER_SIGNATURE: &str = "X-Webhook-Signature";

/// Stored response bodies are cut off beyond this size.
const MAX_RESPONSE_BODY_BYTES: usize = 4 * 1024;

/// Placeholder recorded when a response body cannot be read.
const UNREADABLE_BODY_PLACEHOLDER: &str = "[unreadable response body]";

/// Configuration for the delivery HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout applied to every delivery attempt.
    pub timeout: Duration,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECONDS),
            user_agent: "Hookwire-Webhooks/1.0".to_string(),
        }
    }
}

/// One outbound webhook request, shared across all attempts of a delivery.
///
/// The body and signature are computed once per delivery so every retry
/// transmits byte-identical content; only the retry-count header varies
/// per attempt.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    /// Destination URL.
    pub url: String,
    /// Event wire name for the event header.
    pub event: EventKind,
    /// Envelope timestamp, preformatted RFC 3339.
    pub timestamp: String,
    /// Signature header value, when the subscription has a secret.
    pub signature: Option<String>,
    /// Serialized envelope bytes.
    pub body: Bytes,
}

/// Outcome of a single delivery attempt that reached the endpoint.
#[derive(Debug, Clone)]
pub struct AttemptResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body, truncated and best-effort.
    pub body: String,
    /// Whether the status was 2xx.
    pub is_success: bool,
}

/// HTTP client reused across all deliveries of a dispatcher.
///
/// Connection pooling comes from the underlying `reqwest::Client`; cloning
/// shares the pool.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl DeliveryClient {
    /// Creates a delivery client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the HTTP client cannot be
    /// built with the provided settings.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                DeliveryError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Performs one POST attempt for a delivery.
    ///
    /// Any HTTP response, success or not, yields `Ok`; the caller decides
    /// whether to retry based on the status. Transport failures map to
    /// categorized errors.
    ///
    /// # Errors
    ///
    /// - `DeliveryError::Timeout` when the request exceeds the configured
    ///   timeout
    /// - `DeliveryError::Network` for connection, DNS, or TLS failures
    pub async fn attempt(
        &self,
        request: &DeliveryRequest,
        retry_count: u32,
    ) -> Result<AttemptResponse> {
        debug!(
            url = %request.url,
            event = %request.event,
            retry_count,
            "sending webhook request"
        );

        let mut http_request = self
            .client
            .post(&request.url)
            .header("content-type", "application/json")
            .header(HEADER_EVENT, request.event.as_str())
            .header(HEADER_TIMESTAMP, &request.timestamp)
            .header(HEADER_RETRY_COUNT, retry_count.to_string())
            .body(request.body.clone());

        if let Some(signature) = &request.signature {
            http_request = http_request.header(HEADER_SIGNATURE, signature);
        }

        let response = match http_request.send().await {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    return Err(DeliveryError::timeout(self.config.timeout.as_secs()));
                }
                if e.is_connect() {
                    return Err(DeliveryError::network(format!("connection failed: {e}")));
                }
                return Err(DeliveryError::network(e.to_string()));
            },
        };

        let status_code = response.status().as_u16();
        let is_success = response.status().is_success();

        let body = match response.bytes().await {
            Ok(bytes) => {
                if bytes.len() > MAX_RESPONSE_BODY_BYTES {
                    let truncated = String::from_utf8_lossy(&bytes[..MAX_RESPONSE_BODY_BYTES]);
                    format!("{truncated}... (truncated)")
                } else {
                    String::from_utf8_lossy(&bytes).into_owned()
                }
            },
            Err(e) => {
                // Body read failure is non-fatal; the status code still
                // governs the delivery outcome.
                warn!(url = %request.url, error = %e, "failed to read response body");
                UNREADABLE_BODY_PLACEHOLDER.to_string()
            },
        };

        debug!(url = %request.url, status = status_code, "received webhook response");

        Ok(AttemptResponse { status_code, body, is_success })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;

    fn request_for(url: String) -> DeliveryRequest {
        DeliveryRequest {
            url,
            event: EventKind::ClientCreated,
            timestamp: "2026-01-15T10:30:00.000Z".to_string(),
            signature: None,
            body: Bytes::from_static(br#"{"event":"client.created"}"#),
        }
    }

    #[tokio::test]
    async fn success_response_captured() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/hook"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        let client = DeliveryClient::new(ClientConfig::default()).unwrap();
        let response = client.attempt(&request_for(format!("{}/hook", server.uri())), 0).await;

        let response = response.unwrap();
        assert_eq!(response.status_code, 200);
        assert!(response.is_success);
        assert_eq!(response.body, "OK");
    }

    #[tokio::test]
    async fn server_error_is_ok_with_failure_status() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = DeliveryClient::new(ClientConfig::default()).unwrap();
        let response =
            client.attempt(&request_for(format!("{}/hook", server.uri())), 1).await.unwrap();

        assert_eq!(response.status_code, 500);
        assert!(!response.is_success);
        assert_eq!(response.body, "boom");
    }

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        let client = DeliveryClient::new(ClientConfig::default()).unwrap();

        // Nothing listens on this port.
        let result = client.attempt(&request_for("http://127.0.0.1:49151/hook".to_string()), 0).await;

        assert!(matches!(result, Err(DeliveryError::Network { .. })));
    }

    #[tokio::test]
    async fn metadata_headers_sent() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::header("content-type", "application/json"))
            .and(matchers::header(HEADER_EVENT, "client.created"))
            .and(matchers::header(HEADER_TIMESTAMP, "2026-01-15T10:30:00.000Z"))
            .and(matchers::header(HEADER_RETRY_COUNT, "2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = DeliveryClient::new(ClientConfig::default()).unwrap();
        client.attempt(&request_for(format!("{}/hook", server.uri())), 2).await.unwrap();
    }

    #[tokio::test]
    async fn signature_header_sent_only_when_present() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::header(HEADER_SIGNATURE, "sha256=abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = DeliveryClient::new(ClientConfig::default()).unwrap();
        let mut request = request_for(format!("{}/hook", server.uri()));
        request.signature = Some("sha256=abc".to_string());

        client.attempt(&request, 0).await.unwrap();
    }

    #[tokio::test]
    async fn oversized_body_truncated() {
        let server = MockServer::start().await;
        let huge = "x".repeat(MAX_RESPONSE_BODY_BYTES + 100);
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(huge))
            .mount(&server)
            .await;

        let client = DeliveryClient::new(ClientConfig::default()).unwrap();
        let response =
            client.attempt(&request_for(format!("{}/hook", server.uri())), 0).await.unwrap();

        assert!(response.body.ends_with("... (truncated)"));
        assert!(response.body.len() < MAX_RESPONSE_BODY_BYTES + 32);
    }
}
