use std::time::Duration;
use tracing::{error, info};

use crate::api::yaya::models::normalize_page;
use crate::api::yaya::{ApiError, TransactionPage, WalletProvider};
use crate::utils::errors::AppError;
use crate::utils::retry::{run_with_retry, RetryFailure, RetryPolicy};
use crate::utils::validate::SearchQuery;

pub const LIST_POLICY: RetryPolicy = RetryPolicy::fixed(3, Duration::from_secs(2));

// Only search races a deadline; list waits on the transport
pub const SEARCH_POLICY: RetryPolicy =
    RetryPolicy::fixed(3, Duration::from_secs(2)).with_timeout(Duration::from_secs(30));

const LIST_OPERATION: &str = "getTransactions";
const SEARCH_OPERATION: &str = "searchTransactions";

const LIST_FALLBACK_MESSAGE: &str = "Failed to fetch transactions from YaYa API";
const SEARCH_FALLBACK_MESSAGE: &str = "Failed to search transactions in YaYa API after multiple attempts";
const EMPTY_QUERY_MESSAGE: &str = "Search query is empty. At least one search field must be provided.";

/// Fetch one page of the account's transactions
pub async fn get_transactions(provider: &dyn WalletProvider, page: u32) -> Result<TransactionPage, AppError> {
    info!("Calling YaYa transaction list with page: {}", page);

    let payload = run_with_retry(LIST_OPERATION, LIST_POLICY, move || provider.list(page))
        .await
        .map_err(|failure| into_app_error(LIST_OPERATION, failure, LIST_FALLBACK_MESSAGE))?;

    normalize_page(LIST_OPERATION, payload)
}

/// Search transactions using the highest-priority field of the query
pub async fn search_transactions(
    provider: &dyn WalletProvider,
    query: &SearchQuery,
) -> Result<TransactionPage, AppError> {
    let value = query
        .query_value()
        .ok_or_else(|| AppError::Validation(EMPTY_QUERY_MESSAGE.to_string()))?;

    info!("Calling YaYa transaction search with query value: '{}'", value);

    let payload = run_with_retry(SEARCH_OPERATION, SEARCH_POLICY, move || provider.search(value))
        .await
        .map_err(|failure| into_app_error(SEARCH_OPERATION, failure, SEARCH_FALLBACK_MESSAGE))?;

    normalize_page(SEARCH_OPERATION, payload)
}

fn into_app_error(operation: &str, failure: RetryFailure, fallback: &str) -> AppError {
    match failure {
        RetryFailure::Aborted {
            attempt,
            error: ApiError::InvalidJson(body),
        } => {
            error!(
                "Raw response causing invalid JSON error for {} (attempt {}): {}",
                operation, attempt, body
            );
            AppError::BadUpstreamResponse(format!(
                "YaYa API returned invalid JSON response for {}: {}",
                operation, body
            ))
        }
        RetryFailure::Aborted { error, .. } => AppError::from_upstream(&error, fallback),
        RetryFailure::Exhausted { attempts, last } => {
            error!("{} gave up after {} attempts", operation, attempts);
            AppError::from_upstream(&last, fallback)
        }
    }
}
