//! Error Types
//!
//! Remote failures are classified once, at the HTTP boundary, into the
//! categories the rest of the app reacts to.

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// 401: the session is no longer valid
    #[error("session expired, please log in again")]
    SessionExpired,

    /// 403
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// 404
    #[error("not found: {0}")]
    NotFound(String),

    /// Other 4xx, e.g. server-side validation or conflicts
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// 5xx
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Request never produced a response
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success HTTP status with its response body
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| default_message(status));
        match status {
            401 => ApiError::SessionExpired,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            400..=499 => ApiError::Rejected { status, message },
            _ => ApiError::Server { status, message },
        }
    }

    /// Reads may be retried for transient failures only
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Server { .. } | ApiError::Network(_))
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }

    /// Short text for notifications and inline form errors
    pub fn user_message(&self) -> String {
        match self {
            ApiError::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            ApiError::AccessDenied(_) => "You do not have access to this resource.".to_string(),
            ApiError::NotFound(_) => "The requested resource could not be found.".to_string(),
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Server { .. } => "The server failed to handle the request. Please try again.".to_string(),
            ApiError::Network(_) => "Could not reach the server. Check your connection.".to_string(),
            ApiError::Decode(_) => "The server sent an unexpected response.".to_string(),
        }
    }
}

/// The backend answers errors either as a bare string or as
/// `{"message": "..."}` / `{"error": "..."}`.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(s)) => Some(s),
        Ok(serde_json::Value::Object(map)) => ["message", "error", "detail"]
            .iter()
            .find_map(|k| map.get(*k).and_then(|v| v.as_str()).map(str::to_string)),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}

fn default_message(status: u16) -> String {
    format!("request failed with status {}", status)
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status.as_u16(), "")
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Field-level form error, resolved before any request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}
