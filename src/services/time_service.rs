use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use crate::api::yaya::{ApiError, WalletProvider};
use crate::utils::retry::{run_with_retry, RetryPolicy};

// Any failure is retried, and a silent upstream cannot hold up startup or /health
pub const SERVER_TIME_POLICY: RetryPolicy = RetryPolicy::fixed(3, Duration::from_secs(1))
    .with_timeout(Duration::from_secs(5))
    .retry_everything();

/// Provider clock in epoch milliseconds. Never fails: once retries run out the
/// local clock is returned instead.
pub async fn get_server_time(provider: &dyn WalletProvider) -> i64 {
    let outcome = run_with_retry("getServerTime", SERVER_TIME_POLICY, move || async move {
        let response = provider.server_time().await?;
        info!("getTime response: {}", response);
        parse_server_time(&response)
    })
    .await;

    match outcome {
        Ok(time) => time,
        Err(failure) => {
            error!("Max retries reached for getServerTime, falling back to local timestamp: {:?}", failure);
            chrono::Utc::now().timestamp_millis()
        }
    }
}

fn parse_server_time(response: &Value) -> Result<i64, ApiError> {
    let time = response.get("time");
    time.and_then(Value::as_i64)
        .or_else(|| time.and_then(Value::as_f64).filter(|t| t.is_finite()).map(|t| t as i64))
        .ok_or_else(|| {
            ApiError::DeserializationError(format!("Invalid server time format from YaYa API: {}", response))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::yaya::testing::{ScriptedProvider, Step};
    use serde_json::json;

    #[test]
    fn test_parse_numeric_time() {
        assert_eq!(parse_server_time(&json!({ "time": 1756101350123i64 })).unwrap(), 1756101350123);
        assert_eq!(parse_server_time(&json!({ "time": 1756101350123.0 })).unwrap(), 1756101350123);
    }

    #[test]
    fn test_parse_rejects_non_numeric_time() {
        assert!(parse_server_time(&json!({ "time": "1756101350123" })).is_err());
        assert!(parse_server_time(&json!({})).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_provider_time() {
        let provider = ScriptedProvider::new().on_time(Step::Reply(Ok(json!({ "time": 42 }))));
        assert_eq!(get_server_time(&provider).await, 42);
        assert_eq!(provider.time_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_format_is_retried() {
        let provider = ScriptedProvider::new()
            .on_time(Step::Reply(Ok(json!({ "time": "soon" }))))
            .on_time(Step::Reply(Ok(json!({ "time": 7 }))));

        assert_eq!(get_server_time(&provider).await, 7);
        assert_eq!(provider.time_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_local_clock() {
        let provider = ScriptedProvider::new()
            .on_time(Step::Reply(Err(ApiError::ServerError(500, "down".to_string()))))
            .on_time(Step::Reply(Err(ApiError::Unauthorized("nope".to_string()))))
            .on_time(Step::Reply(Ok(json!({ "time": null }))));

        let before = chrono::Utc::now().timestamp_millis();
        let time = get_server_time(&provider).await;
        let after = chrono::Utc::now().timestamp_millis();

        assert_eq!(provider.time_calls(), 3);
        assert!(before <= time && time <= after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_json_reply_is_retried() {
        let provider = ScriptedProvider::new()
            .on_time(Step::Reply(Err(ApiError::InvalidJson("<html>maintenance</html>".to_string()))))
            .on_time(Step::Reply(Ok(json!({ "time": 42 }))));

        assert_eq!(get_server_time(&provider).await, 42);
        assert_eq!(provider.time_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_upstream_is_abandoned() {
        let provider = ScriptedProvider::new()
            .on_time(Step::Hang)
            .on_time(Step::Reply(Ok(json!({ "time": 42 }))));

        assert_eq!(get_server_time(&provider).await, 42);
        assert_eq!(provider.time_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_upstream_falls_back_to_local_clock() {
        let provider = ScriptedProvider::new()
            .on_time(Step::Hang)
            .on_time(Step::Hang)
            .on_time(Step::Hang);

        let start = tokio::time::Instant::now();
        let before = chrono::Utc::now().timestamp_millis();
        let time = get_server_time(&provider).await;
        let after = chrono::Utc::now().timestamp_millis();

        assert_eq!(provider.time_calls(), 3);
        assert!(before <= time && time <= after);
        // three 5s deadlines plus two 1s gaps
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(17) && elapsed < Duration::from_secs(18));
    }
}
