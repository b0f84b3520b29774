//! Translation of `sqlx` errors onto the store boundary.

use casting_core::store::StoreError;

/// Postgres `undefined_table`.
pub const PG_UNDEFINED_TABLE: &str = "42P01";
/// Postgres `unique_violation`.
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Map a `sqlx::Error` raised while touching `collection` to a [`StoreError`].
pub fn store_error(collection: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(PG_UNDEFINED_TABLE) => return StoreError::MissingCollection(collection),
            Some(PG_UNIQUE_VIOLATION) => {
                return StoreError::Constraint {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                    message: db_err.message().to_string(),
                };
            }
            _ => {}
        }
    }
    StoreError::Backend(err.to_string())
}

/// Build a decode error for a row whose stored value does not fit the record.
pub fn decode_error(
    collection: &'static str,
    id: &str,
    err: impl std::fmt::Display,
) -> StoreError {
    StoreError::Decode {
        collection,
        id: id.to_string(),
        message: err.to_string(),
    }
}
