use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod backend;
mod config;
mod services;
mod utils;

use api::yaya::{MockWalletProvider, WalletProvider, YayaClient};
use config::AppConfig;
use services::time_service;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yaya_proxy=debug,tower_http=info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting YaYa transactions proxy...");

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("YaYa API configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let provider: Arc<dyn WalletProvider> = if config.use_mock {
        warn!("YAYA_USE_MOCK is set, serving fixture transactions");
        Arc::new(MockWalletProvider::new())
    } else {
        info!("Using YaYa API at {}{}", config.upstream_url(), config.api_path);
        Arc::new(YayaClient::new(&config))
    };

    // Best effort: only logged, never blocks startup
    let server_time = time_service::get_server_time(provider.as_ref()).await;
    let skew = server_time - chrono::Utc::now().timestamp_millis();
    info!("Provider clock offset: {}ms", skew);

    if let Err(e) = backend::run_server(&config, provider).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
