use super::config::ClientConfig;
use super::constants::{self, headers};
use super::error::{ApiError, Result};
use super::trace::{LogObserver, NoopObserver, RequestObserver, RequestTrace};
use chrono::Utc;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Structured error body returned by the API on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Value,
    message: String,
}

/// Gravity Forms REST API transport with connection pooling
///
/// Handles authentication, headers, timeouts, status-code mapping and request
/// tracing. It holds no per-call state, so clones can be shared across tasks.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    http_client: reqwest::Client,
    observer: Arc<dyn RequestObserver>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10) // Max idle connections per host
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .user_agent(constants::USER_AGENT)
            .build()
            .map_err(|e| ApiError::Transport {
                reason: format!("Failed to build HTTP client: {}", e),
                status: None,
                body: None,
                source: Some(e),
            })?;

        Ok(Self::with_custom_client(config, http_client))
    }

    /// Create a new client around an existing HTTP client
    ///
    /// The configured timeout is applied to every request regardless of how
    /// `http_client` was built.
    pub fn with_custom_client(config: ClientConfig, http_client: reqwest::Client) -> Self {
        let observer: Arc<dyn RequestObserver> = if config.debug {
            Arc::new(LogObserver::new())
        } else {
            Arc::new(NoopObserver)
        };

        Self {
            config: Arc::new(config),
            http_client,
            observer,
        }
    }

    /// Replace the request observer
    pub fn with_observer(mut self, observer: impl RequestObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue an authenticated JSON request and return the raw response body
    ///
    /// Non-2xx responses become [`ApiError::Api`] when the body is a
    /// `{code, message}` object, and [`ApiError::Transport`] otherwise.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Vec<u8>> {
        let url = constants::endpoint_url(&self.config.base_url, path);

        let mut builder = self
            .http_client
            .request(method.clone(), &url)
            .timeout(self.config.timeout)
            .basic_auth(&self.config.credentials.key, Some(&self.config.credentials.secret))
            .header(ACCEPT, headers::CONTENT_TYPE_JSON)
            .header(CONTENT_TYPE, headers::CONTENT_TYPE_JSON);

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            let payload = serde_json::to_vec(body)
                .map_err(|e| ApiError::decode("request body", body.to_string().as_bytes(), e))?;
            builder = builder.body(payload);
        }

        let request = builder.build().map_err(|e| self.map_reqwest_error(e))?;
        let endpoint = request.url().path().to_string();

        let started_at = Utc::now();
        let start = Instant::now();
        let exchange = self.send(request).await;

        if self.observer.enabled() {
            let (status, body) = match &exchange {
                Ok((status, bytes)) => (
                    Some(status.as_u16()),
                    String::from_utf8_lossy(bytes).into_owned(),
                ),
                Err(e) => (e.status(), String::new()),
            };

            self.observer.observe(&RequestTrace {
                correlation_id: uuid::Uuid::new_v4().to_string(),
                method: method.to_string(),
                endpoint,
                status,
                started_at,
                elapsed: start.elapsed(),
                body,
            });
        }

        let (status, bytes) = exchange?;
        if !status.is_success() {
            return Err(Self::status_error(status, &bytes));
        }

        Ok(bytes)
    }

    /// Issue a request and decode the response body into `T`
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T> {
        let context = format!("{} {} response", method, path);
        let bytes = self.request(method, path, query, body).await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(context, &bytes, e))
    }

    async fn send(&self, request: reqwest::Request) -> Result<(StatusCode, Vec<u8>)> {
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        Ok((status, bytes.to_vec()))
    }

    fn map_reqwest_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            return ApiError::Timeout(self.config.timeout);
        }

        ApiError::Transport {
            reason: format!("Request failed: {}", error),
            status: error.status().map(|s| s.as_u16()),
            body: None,
            source: Some(error),
        }
    }

    fn status_error(status: StatusCode, bytes: &[u8]) -> ApiError {
        match serde_json::from_slice::<ErrorBody>(bytes) {
            Ok(body) => ApiError::Api {
                status: status.as_u16(),
                code: match body.code {
                    Value::String(code) => code,
                    other => other.to_string(),
                },
                message: body.message,
            },
            Err(_) => ApiError::Transport {
                reason: format!("Unexpected status code: {}", status.as_u16()),
                status: Some(status.as_u16()),
                body: (!bytes.is_empty()).then(|| String::from_utf8_lossy(bytes).into_owned()),
                source: None,
            },
        }
    }
}
