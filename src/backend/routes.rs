use axum::{
    routing::{get, post},
    Router,
};
use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/transactions", get(handlers::get_transactions_handler))
        .route("/api/transactions/search", post(handlers::search_transactions_handler))
}
