use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::time::Duration;

use crate::utils::errors::{truncate_for_log, AppError};

/// One side of a transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub account: String,
}

/// Typed view of a transaction record, used to build fixture data.
///
/// Upstream records are never forced through this type; see [`TransactionPage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub sender: Party,
    pub receiver: Party,
    pub amount_with_currency: String,
    pub amount: f64,
    pub amount_in_base_currency: f64,
    pub fee: f64,
    pub currency: String,
    pub cause: String,
    pub sender_caption: String,
    pub receiver_caption: String,
    pub created_at_time: i64,
    pub is_topup: bool,
    pub is_outgoing_transfer: bool,
    pub fee_vat: f64,
    pub fee_before_vat: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// List and search response: one page of transactions plus pagination metadata.
///
/// Records are kept as raw JSON objects and numbers as [`Number`], so the
/// client gets back exactly the values the provider sent (`2500` stays `2500`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub data: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_page: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_sum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_sum: Option<Number>,
}

/// Response from GET /time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTime {
    pub time: i64,
}

/// Request body for POST /transaction/search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequestBody {
    pub query: String,
}

/// Check that an upstream payload carries a `data` array of transaction records
/// and turn it into a [`TransactionPage`]. Values pass through untouched.
pub fn normalize_page(operation: &str, payload: Value) -> Result<TransactionPage, AppError> {
    let well_formed = payload
        .get("data")
        .and_then(Value::as_array)
        .map_or(false, |records| records.iter().all(Value::is_object));

    if !well_formed {
        return Err(AppError::BadUpstreamResponse(format!(
            "Invalid response format from YaYa API for {}: {}",
            operation,
            truncate_for_log(&payload.to_string())
        )));
    }

    let snapshot = truncate_for_log(&payload.to_string());
    serde_json::from_value::<TransactionPage>(payload).map_err(|e| {
        AppError::BadUpstreamResponse(format!(
            "Invalid pagination metadata from YaYa API for {}: {} ({})",
            operation, e, snapshot
        ))
    })
}

/// Comprehensive error type for YaYa API operations
#[derive(Debug, Clone)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 401 Unauthorized
    Unauthorized(String),
    /// 403 Forbidden
    Forbidden(String),
    /// 404 Not Found
    NotFound(String),
    /// 429 Too Many Requests
    RateLimited(String),
    /// 5xx Server Error
    ServerError(u16, String),
    /// Other HTTP errors
    HttpError(u16, String),
    /// Network/request error
    RequestError(String),
    /// Attempt did not finish before the deadline
    Timeout(Duration),
    /// Body was not JSON at all; carries the raw (truncated) body
    InvalidJson(String),
    /// Body was JSON but not the expected shape
    DeserializationError(String),
}

impl ApiError {
    /// HTTP status reported by the upstream, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited(_) => Some(429),
            ApiError::ServerError(code, _) | ApiError::HttpError(code, _) => Some(*code),
            ApiError::RequestError(_)
            | ApiError::Timeout(_)
            | ApiError::InvalidJson(_)
            | ApiError::DeserializationError(_) => None,
        }
    }

    /// Upstream-supplied text, empty when the upstream said nothing
    pub fn detail(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::RateLimited(msg)
            | ApiError::ServerError(_, msg)
            | ApiError::HttpError(_, msg)
            | ApiError::RequestError(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::DeserializationError(msg) => msg,
            ApiError::Timeout(_) => "Request timeout",
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Invalid JSON means the upstream is misbehaving, asking again won't help
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ApiError::InvalidJson(_))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "401 (Unauthorized): {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::RateLimited(msg) => write!(f, "Rate Limited: {}", msg),
            ApiError::ServerError(code, msg) => write!(f, "Server Error ({}): {}", code, msg),
            ApiError::HttpError(code, msg) => write!(f, "HTTP Error ({}): {}", code, msg),
            ApiError::RequestError(msg) => write!(f, "Request Error: {}", msg),
            ApiError::Timeout(limit) => write!(f, "Request timeout after {}s", limit.as_secs()),
            ApiError::InvalidJson(body) => write!(f, "Invalid JSON response: {}", body),
            ApiError::DeserializationError(msg) => write!(f, "Deserialization Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}
