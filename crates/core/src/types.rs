/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monetary values (balances, prices, top-up amounts). Stored as `NUMERIC(18,2)`.
pub type Amount = rust_decimal::Decimal;
