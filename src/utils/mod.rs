pub mod errors;
pub mod ratelimit;
pub mod retry;
pub mod validate;
