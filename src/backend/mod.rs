mod handlers;
mod routes;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::yaya::WalletProvider;
use crate::config::AppConfig;
use crate::utils::errors::AppError;
use crate::utils::ratelimit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn WalletProvider>,
    pub limiter: Arc<RateLimiter>,
    /// Include diagnostic details in error bodies (non-production only)
    pub expose_errors: bool,
}

impl AppState {
    pub fn new(provider: Arc<dyn WalletProvider>, expose_errors: bool) -> Self {
        Self {
            provider,
            limiter: Arc::new(RateLimiter::default()),
            expose_errors,
        }
    }

    /// Wrap an error for the response, honouring the production setting
    pub fn reject(&self, error: AppError) -> handlers::ErrorReply {
        handlers::ErrorReply::new(error, self.expose_errors)
    }
}

/// Reject callers that went over the per-IP budget
async fn rate_limit(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client = connect_info.map(|ConnectInfo(addr)| addr.ip());
    if let Err(wait) = state.limiter.check(client).await {
        warn!("Rate limit hit for {:?}, next slot in {}s", client, wait.as_secs());
        return state.reject(AppError::RateLimited).into_response();
    }
    next.run(request).await
}

fn cors_layer(client_origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(client_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Turn a handler panic into a 500 instead of dropping the connection
fn panic_response(payload: Box<dyn Any + Send + 'static>, expose_errors: bool) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    handlers::ErrorReply::new(AppError::Internal(detail), expose_errors).into_response()
}

/// Build the application router with all routes and middleware
pub fn create_router(state: AppState, client_origin: HeaderValue) -> Router {
    let expose_errors = state.expose_errors;

    // Layers wrap outward: panics and 429s still get CORS and security headers
    Router::new()
        .route("/health", get(handlers::health_handler))
        .merge(routes::api_routes())
        .fallback(handlers::not_found_handler)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(CatchPanicLayer::custom(move |payload: Box<dyn Any + Send + 'static>| {
            panic_response(payload, expose_errors)
        }))
        .layer(cors_layer(client_origin))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured port and serve until Ctrl+C
pub async fn run_server(config: &AppConfig, provider: Arc<dyn WalletProvider>) -> std::io::Result<()> {
    let state = AppState::new(provider, !config.production);
    let app = create_router(state, config.client_origin.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://{}", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, stopping server...");
    };

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal)
        .await
}
