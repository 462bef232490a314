pub mod client;
pub mod mock;
pub mod models;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use serde_json::Value;

pub use client::YayaClient;
pub use mock::MockWalletProvider;
pub use models::{ApiError, TransactionPage};

/// The three upstream calls the proxy depends on.
///
/// Payloads come back as raw JSON so the caller decides whether the shape is acceptable.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// One page of the current account's transactions
    async fn list(&self, page: u32) -> Result<Value, ApiError>;

    /// Transactions matching a single query string
    async fn search(&self, query: &str) -> Result<Value, ApiError>;

    /// `{"time": <epoch millis>}`
    async fn server_time(&self) -> Result<Value, ApiError>;
}
