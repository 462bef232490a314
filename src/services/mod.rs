pub mod time_service;
pub mod transaction_service;
