/// Crate-wide result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Persistence failures. Fatal to the enclosing operation: a failed write
/// aborts its transaction and commits no partial state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// A JSON column failed to (de)serialize.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}
