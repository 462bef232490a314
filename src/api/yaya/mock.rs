use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use tracing::info;

use super::models::{ApiError, Party, ServerTime, Transaction, TransactionPage};
use super::WalletProvider;

/// Account the fixture data is seen from
pub const CURRENT_USER: &str = "yayawalletpi";

const PER_PAGE: usize = 3;

/// In-memory stand-in for the YaYa API, used for local development (`YAYA_USE_MOCK=true`)
pub struct MockWalletProvider {
    transactions: Vec<Transaction>,
}

impl MockWalletProvider {
    pub fn new() -> Self {
        Self {
            transactions: fixture_transactions(),
        }
    }
}

impl Default for MockWalletProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Incoming when the current user receives or the transfer is a top-up
pub fn is_incoming(transaction: &Transaction) -> bool {
    transaction.receiver.account == CURRENT_USER || transaction.is_topup
}

/// Outgoing when the current user sends and it is not a top-up
pub fn is_outgoing(transaction: &Transaction) -> bool {
    transaction.sender.account == CURRENT_USER && !transaction.is_topup
}

/// Whole amounts go out as integers, the way the YaYa API reports them
fn amount_number(amount: f64) -> Option<Number> {
    if amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
        Some(Number::from(amount as i64))
    } else {
        Number::from_f64(amount)
    }
}

/// Build a page payload whose sums cover only the returned records
fn build_page(data: Vec<&Transaction>, last_page: u64, total: u64, per_page: u64) -> Result<Value, ApiError> {
    let incoming_sum: f64 = data.iter().filter(|t| is_incoming(t)).map(|t| t.amount).sum();
    let outgoing_sum: f64 = data.iter().filter(|t| is_outgoing(t)).map(|t| t.amount).sum();

    let records = data
        .into_iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::DeserializationError(format!("Failed to encode mock record: {}", e)))?;

    let page = TransactionPage {
        data: records,
        last_page: Some(Number::from(last_page)),
        total: Some(Number::from(total)),
        per_page: Some(Number::from(per_page)),
        incoming_sum: amount_number(incoming_sum),
        outgoing_sum: amount_number(outgoing_sum),
    };

    serde_json::to_value(page)
        .map_err(|e| ApiError::DeserializationError(format!("Failed to encode mock page: {}", e)))
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn list(&self, page: u32) -> Result<Value, ApiError> {
        info!("[MOCK] Fetching transactions for page {}", page);
        let total = self.transactions.len();
        let last_page = total.div_ceil(PER_PAGE);
        let start = (page.max(1) as usize - 1).saturating_mul(PER_PAGE);

        let data = self.transactions.iter().skip(start).take(PER_PAGE).collect();

        build_page(data, last_page as u64, total as u64, PER_PAGE as u64)
    }

    /// Case-insensitive substring match on id, accounts, and cause
    async fn search(&self, query: &str) -> Result<Value, ApiError> {
        info!("[MOCK] Searching transactions with query '{}'", query);
        let needle = query.to_lowercase();

        let data: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|t| {
                [&t.id, &t.sender.account, &t.receiver.account, &t.cause]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect();

        let count = data.len() as u64;
        build_page(data, 1, count, count)
    }

    async fn server_time(&self) -> Result<Value, ApiError> {
        serde_json::to_value(ServerTime {
            time: chrono::Utc::now().timestamp_millis(),
        })
        .map_err(|e| ApiError::DeserializationError(e.to_string()))
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    id: &str,
    sender: (&str, &str),
    receiver: (&str, &str),
    amount: f64,
    fee: (f64, f64, f64),
    cause: &str,
    created_at_time: i64,
    is_topup: bool,
) -> Transaction {
    let (fee_total, fee_vat, fee_before_vat) = fee;
    Transaction {
        id: id.to_string(),
        sender: Party {
            name: sender.0.to_string(),
            account: sender.1.to_string(),
        },
        receiver: Party {
            name: receiver.0.to_string(),
            account: receiver.1.to_string(),
        },
        amount_with_currency: format_etb(amount),
        amount,
        amount_in_base_currency: amount,
        fee: fee_total,
        currency: "ETB".to_string(),
        cause: cause.to_string(),
        sender_caption: String::new(),
        receiver_caption: String::new(),
        created_at_time,
        is_topup,
        is_outgoing_transfer: false,
        fee_vat,
        fee_before_vat,
        extra: Map::new(),
    }
}

/// "2,500.00 ETB"
fn format_etb(amount: f64) -> String {
    let fixed = format!("{:.2}", amount);
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}.{} ETB", grouped, cents)
}

pub fn fixture_transactions() -> Vec<Transaction> {
    vec![
        record(
            "7446ee50-418f-9c8f-03f2466f514f",
            ("Yaya Wallet Pii", CURRENT_USER),
            ("YaYa PII SC", "antenehgebey"),
            2500.0,
            (5.75, 0.75, 5.0),
            "Pay",
            1756101350,
            false,
        ),
        record(
            "f30a36f1-413b-b9c4-a63d1549aa03",
            ("Yaya Wallet Pii", CURRENT_USER),
            ("Habetamu Worku Feleke", "tewobstatewo"),
            2500.0,
            (5.75, 0.75, 5.0),
            "Pay",
            1756101331,
            false,
        ),
        record(
            "b7a2ed8407-cba5e9575d59",
            ("Surafel Araya", "surafelaraya"),
            ("Yaya Wallet Pii", CURRENT_USER),
            300.0,
            (1.15, 0.15, 1.0),
            "Pay",
            1756033429,
            false,
        ),
        record(
            "9e889994-657-c88b9bcd2fb6",
            ("Yaya Wallet Pii", CURRENT_USER),
            ("Yaya Wallet Pii", CURRENT_USER),
            500.0,
            (1.15, 0.15, 1.0),
            "Top-up",
            1756033389,
            true,
        ),
        record(
            "a2bbd8-47a6-a306-274c6f784c74",
            ("YaYa PII SC", "antenehgebey"),
            ("Yaya Wallet Pii", CURRENT_USER),
            1000.0,
            (2.3, 0.3, 2.0),
            "Allowance",
            1756033360,
            false,
        ),
    ]
}
