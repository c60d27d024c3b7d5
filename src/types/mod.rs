mod errors;
mod timestamp;

pub use timestamp::parse_timestamp;

pub type TransactionId = u32;
pub type UserId = u32;

/// Fixed-point amount. Sign is not constrained.
pub type Amount = rust_decimal::Decimal;

/// Wall-clock timestamp without an attached zone.
pub type Timestamp = chrono::NaiveDateTime;
