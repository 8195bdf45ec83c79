use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{header, Client, IntoUrl, Method, RequestBuilder, Response};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{VsmError, VsmResult};
use crate::logging::{truncate_field, DEFAULT_MAX_FIELD_LENGTH};
use crate::transport::{Resource, ResourceRef, ResourceTransport, VsmConfig};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
/// Backoff stops growing after 2^5 times the base delay.
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// HTTP transport for the VSM REST API.
#[derive(Clone)]
pub struct HttpTransport {
    config: Arc<VsmConfig>,
    endpoint: Url,
    client: Client,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VsmError::Configuration`] if the endpoint is not an http(s)
    /// URL, the auth token is empty, or the HTTP client cannot be built.
    pub fn new(config: VsmConfig) -> VsmResult<Self> {
        let endpoint = Url::parse(config.endpoint()).map_err(|e| VsmError::Configuration {
            message: format!("Invalid endpoint '{}': {}", config.endpoint(), e),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(VsmError::Configuration {
                message: format!("Unsupported endpoint scheme '{}'", endpoint.scheme()),
            });
        }
        if config.auth_token().is_empty() {
            return Err(VsmError::Configuration {
                message: "Auth token must not be empty".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| VsmError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            config: Arc::new(config),
            endpoint,
            client,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &VsmConfig {
        &self.config
    }

    fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .header(AUTH_TOKEN_HEADER, self.config.auth_token().expose())
    }

    async fn send(&self, request: RequestBuilder) -> VsmResult<Response> {
        request.send().await.map_err(|e| VsmError::Network {
            message: e.to_string(),
        })
    }

    /// URL of a single member, optionally followed by a sub-resource.
    ///
    /// The id is pushed as one percent-encoded segment so it cannot escape
    /// the collection or inject a query string.
    fn member_url(&self, target: &ResourceRef, suffix: Option<&str>) -> VsmResult<Url> {
        let id = target.id_segment()?;
        let mut url = self.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| VsmError::Configuration {
                message: format!("Endpoint '{}' cannot carry a path", self.endpoint),
            })?;
            segments.pop_if_empty().push(target.collection).push(&id);
            segments.extend(suffix);
        }
        Ok(url)
    }

    /// One GET attempt, no retries.
    async fn fetch_envelope(&self, path: &str, envelope_key: &str) -> VsmResult<Vec<Resource>> {
        let url = format!("{}{}", self.config.endpoint(), path);
        let response = self.send(self.request(Method::GET, url)).await?;
        let body: Value = self.handle_response(response).await?;
        decode_envelope(body, envelope_key)
    }

    /// Send a request whose response body is not needed.
    async fn execute(&self, request: RequestBuilder) -> VsmResult<()> {
        let response = self.send(request).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error_response(response).await
        }
    }

    /// Calculate exponential backoff delay with jitter.
    ///
    /// `base * 2^attempt` with the exponent capped, plus up to 10% jitter.
    /// A server-provided `Retry-After` replaces the configured base. The
    /// result never exceeds the configured maximum retry delay.
    fn calculate_backoff(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let ceiling = self.config.max_retry_delay();
        let base = retry_after
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.config.retry_base_delay());
        let backoff = base
            .saturating_mul(1u32 << attempt.min(MAX_BACKOFF_EXPONENT))
            .min(ceiling);

        let jitter_cap = u64::try_from(backoff.as_millis() / 10).unwrap_or(u64::MAX);
        let jitter_ms = if jitter_cap == 0 {
            0
        } else {
            rand::rng().random_range(0..jitter_cap)
        };
        backoff
            .saturating_add(Duration::from_millis(jitter_ms))
            .min(ceiling)
    }

    /// Handle a successful or error response.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
    ) -> VsmResult<T> {
        if response.status().is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| VsmError::Serialization {
                    message: e.to_string(),
                })
        } else {
            self.handle_error_response(response).await
        }
    }

    /// Convert an error response to a VsmError.
    async fn handle_error_response<T>(&self, response: Response) -> VsmResult<T> {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let body = response.text().await.unwrap_or_default();
        debug!(
            status,
            body = %truncate_field(&body, DEFAULT_MAX_FIELD_LENGTH),
            "Error response"
        );
        let message = fault_message(&body);

        match status {
            400 => Err(VsmError::InvalidRequest { message }),
            401 => Err(VsmError::Authentication { message }),
            403 => Err(VsmError::Forbidden { message }),
            404 => Err(VsmError::NotFound { message }),
            429 => Err(VsmError::RateLimited {
                retry_after_secs: retry_after,
            }),
            status => Err(VsmError::ServerError { status, message }),
        }
    }
}

/// Pull the array stored under `envelope_key` out of a response body.
fn decode_envelope(body: Value, envelope_key: &str) -> VsmResult<Vec<Resource>> {
    let missing = || VsmError::MissingEnvelope {
        key: envelope_key.to_string(),
    };

    let Value::Object(mut body) = body else {
        return Err(missing());
    };
    let items = body.remove(envelope_key).ok_or_else(missing)?;

    serde_json::from_value(items).map_err(|e| VsmError::Serialization {
        message: format!("Malformed `{}` entries: {}", envelope_key, e),
    })
}

/// Unwrap an OpenStack-style fault body, `{"itemNotFound": {"message": ...}}`,
/// falling back to the raw body.
fn fault_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fault)) if fault.len() == 1 => fault
            .values()
            .next()
            .and_then(|detail| detail.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}

#[async_trait]
impl ResourceTransport for HttpTransport {
    #[instrument(skip(self))]
    async fn list_resources(&self, path: &str, envelope_key: &str) -> VsmResult<Vec<Resource>> {
        let mut attempt = 0;
        loop {
            match self.fetch_envelope(path, envelope_key).await {
                Ok(resources) => {
                    debug!(count = resources.len(), "Resource list received");
                    return Ok(resources);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries() => {
                    let delay = self.calculate_backoff(attempt, e.retry_after());
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retryable error listing resources: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, target: &ResourceRef) -> VsmResult<()> {
        let url = self.member_url(target, None)?;
        self.execute(self.request(Method::DELETE, url)).await
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, target: &ResourceRef, fields: &Map<String, Value>) -> VsmResult<()> {
        let mut body = Map::new();
        body.insert(target.member_key.to_string(), Value::Object(fields.clone()));

        let url = self.member_url(target, None)?;
        self.execute(self.request(Method::PUT, url).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn force_delete(&self, target: &ResourceRef) -> VsmResult<()> {
        let url = self.member_url(target, Some("action"))?;
        let body = json!({ "os-force_delete": null });

        self.execute(self.request(Method::POST, url).json(&body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ResourceId;

    fn transport() -> HttpTransport {
        HttpTransport::new(VsmConfig::new("http://localhost:1", "test-token").with_max_retries(0))
            .unwrap()
    }

    #[test]
    fn test_transport_creation() {
        let transport = HttpTransport::new(VsmConfig::new("http://controller:8778/v1", "t"));
        assert!(transport.is_ok());
    }

    #[test]
    fn test_transport_rejects_bad_endpoint() {
        let result = HttpTransport::new(VsmConfig::new("not a url", "t"));
        assert!(matches!(result, Err(VsmError::Configuration { .. })));

        let result = HttpTransport::new(VsmConfig::new("ftp://controller/v1", "t"));
        assert!(matches!(result, Err(VsmError::Configuration { .. })));
    }

    #[test]
    fn test_transport_rejects_empty_token() {
        let result = HttpTransport::new(VsmConfig::new("http://controller:8778/v1", ""));
        assert!(matches!(
            result,
            Err(VsmError::Configuration { ref message }) if message.contains("token")
        ));
    }

    #[test]
    fn test_member_url_encodes_id_as_one_segment() {
        let transport =
            HttpTransport::new(VsmConfig::new("http://controller:8778/v1/tenant/", "t")).unwrap();
        let target = |id: &str| {
            ResourceRef::new("performance_metrics", "performance_metric", ResourceId::from(id))
        };

        let cases = [
            ("42", "/v1/tenant/performance_metrics/42"),
            ("../other", "/v1/tenant/performance_metrics/..%2Fother"),
            ("a?b=1", "/v1/tenant/performance_metrics/a%3Fb=1"),
            ("with space", "/v1/tenant/performance_metrics/with%20space"),
            ("50%", "/v1/tenant/performance_metrics/50%25"),
        ];
        for (id, path) in cases {
            let url = transport.member_url(&target(id), None).unwrap();
            assert_eq!(url.path(), path, "id {id:?}");
            assert_eq!(url.query(), None, "id {id:?}");
        }

        let url = transport.member_url(&target("a/b"), Some("action")).unwrap();
        assert_eq!(url.path(), "/v1/tenant/performance_metrics/a%2Fb/action");
    }

    #[test]
    fn test_member_url_at_host_root() {
        let transport = HttpTransport::new(VsmConfig::new("http://controller:8778", "t")).unwrap();
        let target =
            ResourceRef::new("performance_metrics", "performance_metric", ResourceId::Int(7));
        let url = transport.member_url(&target, None).unwrap();
        assert_eq!(url.as_str(), "http://controller:8778/performance_metrics/7");
    }

    #[test]
    fn test_member_url_rejects_dot_segments() {
        let transport = transport();
        for id in ["", ".", ".."] {
            let target =
                ResourceRef::new("performance_metrics", "performance_metric", ResourceId::from(id));
            let result = transport.member_url(&target, None);
            assert!(matches!(result, Err(VsmError::Encoding { .. })), "id {id:?}");
        }
    }

    #[tokio::test]
    async fn test_list_unreachable_endpoint_is_network_error() {
        let result = transport()
            .list_resources("/performance_metrics/get_list", "performance_metrics")
            .await;
        assert!(matches!(result, Err(VsmError::Network { .. })));
    }

    #[test]
    fn test_calculate_backoff() {
        let transport = HttpTransport::new(
            VsmConfig::new("http://localhost:1", "t").with_retry_base_delay(Duration::from_secs(1)),
        )
        .unwrap();

        let delay0 = transport.calculate_backoff(0, None);
        assert!(delay0 >= Duration::from_secs(1));
        assert!(delay0 < Duration::from_millis(1100));

        let delay1 = transport.calculate_backoff(1, None);
        assert!(delay1 >= Duration::from_secs(2));
        assert!(delay1 < Duration::from_millis(2200));

        let delay_capped = transport.calculate_backoff(10, None);
        assert!(delay_capped >= Duration::from_secs(32));
        assert!(delay_capped < Duration::from_millis(35200));
    }

    #[test]
    fn test_calculate_backoff_uses_retry_after() {
        let delay = transport().calculate_backoff(0, Some(5));
        assert!(delay >= Duration::from_secs(5));
        assert!(delay < Duration::from_millis(5500));
    }

    #[test]
    fn test_calculate_backoff_is_capped() {
        let delay = transport().calculate_backoff(1, Some(u64::MAX));
        assert_eq!(delay, Duration::from_secs(60));

        let transport = HttpTransport::new(
            VsmConfig::new("http://localhost:1", "t")
                .with_retry_base_delay(Duration::from_secs(10))
                .with_max_retry_delay(Duration::from_secs(15)),
        )
        .unwrap();
        assert_eq!(transport.calculate_backoff(u32::MAX, None), Duration::from_secs(15));
        assert_eq!(transport.calculate_backoff(3, Some(u64::MAX)), Duration::from_secs(15));
    }

    #[test]
    fn test_decode_envelope() {
        let body = json!({
            "performance_metrics": [
                {"id": 1, "metric": "cpu_usage", "value": 12.5},
                {"id": "2", "metric": "iops"}
            ]
        });
        let resources = decode_envelope(body, "performance_metrics").unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].id, ResourceId::Int(1));
        assert_eq!(resources[1].id, ResourceId::Text("2".to_string()));
    }

    #[test]
    fn test_decode_envelope_missing_key() {
        let result = decode_envelope(json!({"metrics": []}), "performance_metrics");
        assert!(matches!(
            result,
            Err(VsmError::MissingEnvelope { ref key }) if key == "performance_metrics"
        ));

        let result = decode_envelope(json!([]), "performance_metrics");
        assert!(matches!(result, Err(VsmError::MissingEnvelope { .. })));
    }

    #[test]
    fn test_decode_envelope_malformed_entries() {
        let body = json!({"performance_metrics": [{"value": 1}]});
        let result = decode_envelope(body, "performance_metrics");
        assert!(matches!(result, Err(VsmError::Serialization { .. })));
    }

    #[test]
    fn test_fault_message() {
        let body = r#"{"itemNotFound": {"message": "Metric 9 could not be found.", "code": 404}}"#;
        assert_eq!(fault_message(body), "Metric 9 could not be found.");

        assert_eq!(fault_message("plain failure"), "plain failure");
        assert_eq!(fault_message(r#"{"a": 1, "b": 2}"#), r#"{"a": 1, "b": 2}"#);
    }
}
