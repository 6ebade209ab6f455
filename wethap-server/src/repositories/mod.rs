mod info;
mod manual_info;
mod sender;

pub use info::InfoRepository;
pub use manual_info::ManualInfoRepository;
pub use sender::SenderRepository;

/// Whether `error` is a unique-constraint failure on `column` of `table`.
pub(crate) fn is_unique_violation(error: &sqlx::Error, table: &str, column: &str) -> bool {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            db.message().contains(&format!("{}.{}", table, column))
        }
        _ => false,
    }
}
