/// Store identifiers are opaque strings (document IDs carried over from the
/// hosted backend, UUIDs for rows created here).
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
