/// Crate-wide result type for announcement operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the public announcement operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input, rejected before any side effect.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// The requested announcement does not exist in this guild.
    #[error("announcement not found: {id}")]
    NotFound { id: String },

    /// A messaging failure that escaped the per-channel boundary (channel
    /// verification, not delivery fan-out).
    #[error(transparent)]
    Gateway(#[from] herald_channels::Error),

    /// Config store failure. Fatal to the whole call; no partial state is
    /// committed past the failing write.
    #[error(transparent)]
    Persistence(#[from] herald_store::Error),
}

impl Error {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}
