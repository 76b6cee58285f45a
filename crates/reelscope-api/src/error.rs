//! Error types for the backend API client.

use serde_json::Value;

/// Fallback message when the server gives no structured error.
const GENERIC_FAILURE: &str = "Request failed";

/// Result alias used throughout the client.
pub type Result<T> = std::result::Result<T, ApiError>;

/// A failed API call.
///
/// Cancellation is reported as [`ApiError::Aborted`] and is not a
/// user-visible failure; see [`ApiError::user_message`].
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ApiError {
    /// The caller cancelled the request before it completed.
    #[error("request aborted")]
    Aborted,

    /// The server answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Status {
        /// Human-readable message, taken from the body when available.
        message: String,
        /// HTTP status code.
        status: u16,
        /// Parsed body, if it was JSON.
        body: Option<Value>,
    },

    /// The request never reached the server or the response was lost.
    #[error("network request failed")]
    Network(#[source] reqwest::Error),

    /// A success response carried a body of the wrong shape.
    #[error("failed to decode response from {path}")]
    Decode {
        /// Request path.
        path: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialised.
    #[error("failed to encode request body")]
    Encode(#[source] serde_json::Error),

    /// Input was rejected before any network call was made.
    #[error("{0}")]
    Validation(String),

    /// The request URL could not be built.
    #[error("invalid request URL")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Builds a [`ApiError::Status`] from a status code and optional JSON body.
    ///
    /// Prefers the body's `error` field, then `status_message`, then a
    /// generic fallback.
    #[must_use]
    pub fn from_status(status: u16, body: Option<Value>) -> Self {
        let message = body
            .as_ref()
            .and_then(|b| {
                ["error", "status_message"]
                    .iter()
                    .find_map(|field| b.get(field).and_then(Value::as_str))
            })
            .filter(|m| !m.trim().is_empty())
            .map_or_else(|| String::from(GENERIC_FAILURE), String::from);

        Self::Status {
            message,
            status,
            body,
        }
    }

    /// Returns `true` for cancelled requests.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// HTTP status for server-side failures.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for a per-view error slot.
    ///
    /// Returns `None` for [`ApiError::Aborted`]: cancellation must never
    /// populate an error field.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Aborted => None,
            Self::Status { message, .. } | Self::Validation(message) => Some(message.clone()),
            Self::Network(_) | Self::Url(_) => Some(String::from(GENERIC_FAILURE)),
            Self::Decode { .. } | Self::Encode(_) => Some(self.to_string()),
        }
    }
}

/// A string did not name a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseValueError {
    /// What was being parsed (e.g. "media type").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: String::from(value),
        }
    }
}
