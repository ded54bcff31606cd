/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// External supplier identifier, distinct from the supplier row id.
pub type SupplierId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
