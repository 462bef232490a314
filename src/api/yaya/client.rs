use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

use super::models::{ApiError, SearchRequestBody};
use super::WalletProvider;
use crate::config::AppConfig;
use crate::utils::errors::truncate_for_log;

type HmacSha256 = Hmac<Sha256>;

const API_KEY_HEADER: &str = "yaya-api-key";
const TIMESTAMP_HEADER: &str = "yaya-api-timestamp";
const SIGNATURE_HEADER: &str = "yaya-api-sign";

/// YaYa Wallet API client for reading the account's transaction history
pub struct YayaClient {
    http_client: HttpClient,
    api_key: String,
    api_secret: String,
    base_url: String,
    api_path: String,
}

impl YayaClient {
    /// Create a client pointed at the upstream selected by the configuration
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(
            config.api_key.clone(),
            config.api_secret.clone(),
            config.upstream_url().to_string(),
            config.api_path.clone(),
        )
    }

    /// Create a new client with custom base URL (for testing)
    pub fn with_base_url(api_key: String, api_secret: String, base_url: String, api_path: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_secret,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_path: api_path.trim_end_matches('/').to_string(),
        }
    }

    /// Path that goes into the signature, e.g. `/api/en/transaction/search`
    fn endpoint(&self, resource: &str) -> String {
        format!("{}{}", self.api_path, resource)
    }

    /// `base64(HMAC-SHA256(secret, timestamp + METHOD + endpoint + body))`
    fn sign(&self, timestamp: i64, method: &Method, endpoint: &str, body: &str) -> Result<String, ApiError> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| ApiError::RequestError(format!("Failed to create signer: {}", e)))?;
        mac.update(format!("{}{}{}{}", timestamp, method.as_str(), endpoint, body).as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Create signed headers for one request
    fn create_headers(&self, method: &Method, endpoint: &str, body: &str) -> Result<HeaderMap, ApiError> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let signature = self.sign(timestamp, method, endpoint, body)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let header_value = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| ApiError::RequestError(format!("Failed to create auth header: {}", e)))
        };
        headers.insert(API_KEY_HEADER, header_value(&self.api_key)?);
        headers.insert(TIMESTAMP_HEADER, header_value(&timestamp.to_string())?);
        headers.insert(SIGNATURE_HEADER, header_value(&signature)?);

        Ok(headers)
    }

    /// Send a request and hand back the parsed JSON body
    async fn send(
        &self,
        method: Method,
        resource: &str,
        query: &[(&str, String)],
        body: Option<String>,
        signed: bool,
    ) -> Result<Value, ApiError> {
        let endpoint = self.endpoint(resource);
        let url = format!("{}{}", self.base_url, endpoint);
        let body_text = body.unwrap_or_default();

        let mut request = self.http_client.request(method.clone(), &url).query(query);
        if signed {
            request = request.headers(self.create_headers(&method, &endpoint, &body_text)?);
        }
        if !body_text.is_empty() {
            request = request.body(body_text);
        }

        debug!("{} {}", method, url);
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::RequestError(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::RequestError(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(handle_error_response(status, text));
        }

        parse_json_body(&text)
    }
}

#[async_trait]
impl WalletProvider for YayaClient {
    /// GET /transaction/find-by-user?p={page}
    async fn list(&self, page: u32) -> Result<Value, ApiError> {
        self.send(
            Method::GET,
            "/transaction/find-by-user",
            &[("p", page.to_string())],
            None,
            true,
        )
        .await
    }

    /// POST /transaction/search
    async fn search(&self, query: &str) -> Result<Value, ApiError> {
        let body = serde_json::to_string(&SearchRequestBody { query: query.to_string() })
            .map_err(|e| ApiError::RequestError(format!("Failed to encode search body: {}", e)))?;
        self.send(Method::POST, "/transaction/search", &[], Some(body), true).await
    }

    /// GET /time (unsigned)
    async fn server_time(&self) -> Result<Value, ApiError> {
        self.send(Method::GET, "/time", &[], None, false).await
    }
}

/// Parse a success body, keeping the raw text when it is not JSON
fn parse_json_body(text: &str) -> Result<Value, ApiError> {
    serde_json::from_str::<Value>(text).map_err(|e| {
        warn!("YaYa API returned a non-JSON body: {}", e);
        ApiError::InvalidJson(truncate_for_log(text))
    })
}

/// Parse error response based on HTTP status code
fn handle_error_response(status: StatusCode, body_text: String) -> ApiError {
    let status_code = status.as_u16();

    // YaYa reports errors as {"message": "..."} or {"error": "..."}
    let message = serde_json::from_str::<Value>(&body_text)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate_for_log(&body_text));

    match status_code {
        400 => ApiError::BadRequest(message),
        401 => ApiError::Unauthorized(message),
        403 => ApiError::Forbidden(message),
        404 => ApiError::NotFound(message),
        429 => {
            warn!("Rate limited by YaYa API: {}", message);
            ApiError::RateLimited(message)
        }
        500..=599 => {
            warn!("Server error {}: {}", status_code, message);
            ApiError::ServerError(status_code, message)
        }
        _ => ApiError::HttpError(status_code, message),
    }
}
