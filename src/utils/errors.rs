use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::api::yaya::ApiError;

/// Longest upstream snippet carried in an error or log line
pub const MAX_DIAGNOSTIC_CHARS: usize = 500;

/// Errors surfaced at the HTTP boundary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Bad upstream response: {0}")]
    BadUpstreamResponse(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("{0}")]
    NotFound(String),
    #[error("Too many requests, please try again later.")]
    RateLimited,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body: `{"error": ...}` plus `details` outside production
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// Convert an upstream failure that survived every retry.
    /// Keeps the upstream status (500 without one) and its message, or `fallback` when it gave none.
    pub fn from_upstream(error: &ApiError, fallback: &str) -> Self {
        let message = if error.detail().trim().is_empty() {
            fallback.to_string()
        } else {
            error.to_string()
        };

        AppError::Upstream {
            status: error.status().unwrap_or(500),
            message,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadUpstreamResponse(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show to any client
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadUpstreamResponse(_) => "Bad response from wallet provider".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn to_body(&self, expose_details: bool) -> ErrorBody {
        let details = match self {
            AppError::BadUpstreamResponse(_) | AppError::Internal(_) | AppError::Upstream { .. }
                if expose_details =>
            {
                Some(self.to_string())
            }
            _ => None,
        };

        ErrorBody {
            error: self.public_message(),
            details,
        }
    }
}

/// Cut an upstream body down to [`MAX_DIAGNOSTIC_CHARS`] characters for logs and diagnostics
pub fn truncate_for_log(text: &str) -> String {
    match text.char_indices().nth(MAX_DIAGNOSTIC_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
