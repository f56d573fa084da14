use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_REQUEST_ERROR: &str = "An error occurred during the API request";

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("{message}")]
    Transport { message: String },

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status { message: String, code: String },

    /// A success response whose body was not the expected JSON document.
    #[error("{message}")]
    Decode { message: String },
}

/// The `{message, code?}` shape errors take when shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    /// Build a status error from a non-2xx body, preferring the body's own
    /// `message` field.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_REQUEST_ERROR.to_string());

        ApiError::Status {
            message,
            code: status.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Transport { message }
            | ApiError::Status { message, .. }
            | ApiError::Decode { message } => message,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Status { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            message: self.message().to_string(),
            code: self.code().map(String::from),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport {
            message: err.to_string(),
        }
    }
}

/// Failure of the persisted session store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Session record is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
