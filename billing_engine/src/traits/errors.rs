pub use payment_gateways::ErrorKind;

/// True for SQLite's "UNIQUE constraint failed" error.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
