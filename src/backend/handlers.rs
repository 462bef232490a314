use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::api::yaya::TransactionPage;
use crate::backend::AppState;
use crate::services::{time_service, transaction_service};
use crate::utils::errors::AppError;
use crate::utils::validate::{self, SearchRequest};

/// An [`AppError`] on its way to the client
pub struct ErrorReply {
    error: AppError,
    expose_details: bool,
}

impl ErrorReply {
    pub fn new(error: AppError, expose_details: bool) -> Self {
        Self { error, expose_details }
    }
}

impl IntoResponse for ErrorReply {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        // Full detail always stays in the server log
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self.error);
        } else {
            warn!("Request rejected with {}: {}", status, self.error);
        }
        (status, Json(self.error.to_body(self.expose_details))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub p: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: i64,
}

/// GET /api/transactions?p=<page>
pub async fn get_transactions_handler(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<TransactionPage>, ErrorReply> {
    let page = params
        .map_err(|e| AppError::Validation(e.body_text()))
        .and_then(|Query(params)| validate::parse_page(params.p.as_deref()))
        .map_err(|e| state.reject(e))?;

    transaction_service::get_transactions(state.provider.as_ref(), page)
        .await
        .map(Json)
        .map_err(|e| state.reject(e))
}

/// POST /api/transactions/search
pub async fn search_transactions_handler(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<TransactionPage>, ErrorReply> {
    let Json(request) = body.map_err(|e| state.reject(AppError::Validation(e.body_text())))?;
    let query = request.validate().map_err(|e| state.reject(e))?;

    transaction_service::search_transactions(state.provider.as_ref(), &query)
        .await
        .map(Json)
        .map_err(|e| state.reject(e))
}

/// GET /health, reports the provider clock (or ours, when the provider is unreachable)
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let time = time_service::get_server_time(state.provider.as_ref()).await;
    (StatusCode::OK, Json(HealthResponse { status: "ok", time }))
}

pub async fn not_found_handler(State(state): State<AppState>, uri: Uri) -> ErrorReply {
    warn!("No route for {}", uri);
    state.reject(AppError::NotFound("Not Found".to_string()))
}
