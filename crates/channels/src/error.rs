use std::error::Error as StdError;

/// Crate-wide result type for messaging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors crossing the messaging boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An identifier does not match the provider's numeric id shape.
    /// Rejected before any side effect.
    #[error("invalid {what} id: {value}")]
    InvalidId { what: &'static str, value: String },

    /// A channel or message no longer exists on the provider side.
    ///
    /// Expected and recoverable: an edit hitting this falls back to a fresh
    /// send, and a best-effort delete treats it as success.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Any other provider failure: network, permissions, rate limiting.
    /// Recorded per channel; never aborts a sibling channel's operation.
    #[error("gateway request failed: {context}: {source}")]
    Gateway {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_id(what: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidId {
            what,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn gateway(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Gateway {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether the external object this operation touched is gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
