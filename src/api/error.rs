//! Error taxonomy for Gravity Forms API operations
//!
//! Every failure the library can produce is one of these variants. Errors are
//! never recovered from inside the library; they propagate to the caller of
//! the service facade untouched.

use std::time::Duration;

use thiserror::Error;

/// Maximum number of payload characters kept in a [`ApiError::Decode`] preview
pub const PAYLOAD_PREVIEW_LEN: usize = 512;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Coarse classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Decode,
    Api,
    Transport,
    Timeout,
    NotFound,
}

/// Gravity Forms API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required identifier was missing before any request was made
    #[error("Validation failed: {0}")]
    Validation(String),

    /// JSON could not be encoded or decoded
    #[error("Failed to decode {context}: {source} (payload: {payload})")]
    Decode {
        context: String,
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    /// The server answered with a structured `{code, message}` error body
    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Network failure, or a non-2xx status without a structured body
    #[error("Transport error: {reason}")]
    Transport {
        reason: String,
        status: Option<u16>,
        body: Option<String>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The configured client-side deadline was exceeded
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// A listing produced zero results
    #[error("No entries found: {0}")]
    NotFound(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Build a decode error, keeping a bounded preview of the offending payload
    pub fn decode(context: impl Into<String>, payload: &[u8], source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            payload: payload_preview(payload),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Api { .. } => ErrorKind::Api,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// HTTP status code associated with this error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

fn payload_preview(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    if text.chars().count() <= PAYLOAD_PREVIEW_LEN {
        return text.into_owned();
    }

    let mut preview: String = text.chars().take(PAYLOAD_PREVIEW_LEN).collect();
    preview.push_str("...");
    preview
}
