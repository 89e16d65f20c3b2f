//! Request tracing for Gravity Forms API calls
//!
//! The client builds a [`RequestTrace`] once a call has finished, successfully
//! or not, and hands it to a [`RequestObserver`]. Observers only see the
//! trace; they cannot alter the result returned to the caller.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::json;

/// Default number of body characters kept by [`LogObserver`]
pub const DEFAULT_MAX_BODY_LEN: usize = 32 * 1024;

/// Everything recorded about one HTTP exchange
#[derive(Debug, Clone)]
pub struct RequestTrace {
    /// Unique correlation ID for this call
    pub correlation_id: String,
    pub method: String,
    /// URL path of the endpoint, without the query string
    pub endpoint: String,
    /// Status code, if a response was received
    pub status: Option<u16>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// Response body text (lossy UTF-8)
    pub body: String,
}

impl RequestTrace {
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.started_at + chrono::Duration::from_std(self.elapsed).unwrap_or_default()
    }

    pub fn is_error(&self) -> bool {
        self.status.is_none_or(|status| status >= 400)
    }
}

/// Side-effecting sink for request traces
pub trait RequestObserver: Send + Sync + fmt::Debug {
    /// Whether traces should be built at all
    fn enabled(&self) -> bool {
        true
    }

    fn observe(&self, trace: &RequestTrace);
}

/// Observer that discards every trace
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn enabled(&self) -> bool {
        false
    }

    fn observe(&self, _trace: &RequestTrace) {}
}

/// Observer that writes one structured line per call through `log`
#[derive(Debug, Clone)]
pub struct LogObserver {
    max_body_len: usize,
}

impl LogObserver {
    pub fn new() -> Self {
        Self {
            max_body_len: DEFAULT_MAX_BODY_LEN,
        }
    }

    pub fn with_max_body_len(mut self, max_body_len: usize) -> Self {
        self.max_body_len = max_body_len;
        self
    }

    /// Structured representation of a trace, as logged
    pub fn render(&self, trace: &RequestTrace) -> serde_json::Value {
        json!({
            "event": "http_exchange",
            "correlation_id": trace.correlation_id,
            "method": trace.method,
            "endpoint": trace.endpoint,
            "status_code": trace.status,
            "started_at": trace.started_at.to_rfc3339(),
            "finished_at": trace.finished_at().to_rfc3339(),
            "duration_ms": trace.elapsed.as_millis(),
            "body": self.truncate_body(&trace.body),
        })
    }

    fn truncate_body(&self, body: &str) -> String {
        let length = body.chars().count();
        if length <= self.max_body_len {
            return body.to_string();
        }

        let kept: String = body.chars().take(self.max_body_len).collect();
        format!("{}... [truncated, {} chars total]", kept, length)
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestObserver for LogObserver {
    fn observe(&self, trace: &RequestTrace) {
        let log_data = self.render(trace);

        if trace.is_error() {
            warn!("HTTP Exchange (Error): {}", log_data);
        } else {
            debug!("HTTP Exchange: {}", log_data);
        }
    }
}
