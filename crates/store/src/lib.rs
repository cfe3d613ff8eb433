//! Persistent storage for announcement configurations and their per-channel
//! publication records.
//!
//! The store is the sole persistent owner of announcement state; the
//! reconciliation engine holds only transient per-call state on top of it.

pub mod error;
pub mod sqlite;
pub mod types;

pub use {
    error::{Error, Result},
    sqlite::SqliteAnnouncementStore,
    types::{AnnouncementConfig, ButtonStyle, ChannelTarget, ConfigButton},
};

use async_trait::async_trait;

/// Persistence contract for announcement configs and channel targets.
///
/// `replace_targets` is the only multi-row write and the only atomicity
/// requirement: it replaces a config's whole target set in one transaction,
/// so readers never observe a partially replaced set. There is no partial
/// target update; callers carry prior message ids forward into the rows
/// they pass in.
#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    async fn create(&self, config: &AnnouncementConfig) -> Result<()>;

    /// Update the editable columns of a config row. Identity and
    /// attribution columns (`id`, `guild_id`, `created_by`, `created_at`)
    /// and the engine-owned `message_id` are never touched here.
    async fn update(&self, config: &AnnouncementConfig) -> Result<()>;

    /// Delete a config row and its target rows in one transaction.
    async fn delete(&self, id: &str, guild_id: &str) -> Result<()>;

    async fn get(&self, id: &str, guild_id: &str) -> Result<Option<AnnouncementConfig>>;

    async fn list_by_guild(&self, guild_id: &str) -> Result<Vec<AnnouncementConfig>>;

    /// Target rows for a config, in insertion order.
    async fn targets(&self, config_id: &str) -> Result<Vec<ChannelTarget>>;

    /// Atomically replace a config's whole target set
    /// (delete-all-then-insert-all). Any write failure aborts the
    /// transaction and leaves the prior set intact.
    async fn replace_targets(&self, config_id: &str, targets: &[ChannelTarget]) -> Result<()>;

    /// Maintain the single "primary" message id kept on the config row for
    /// single-channel consumers.
    async fn set_primary_message_id(
        &self,
        config_id: &str,
        message_id: Option<&str>,
    ) -> Result<()>;
}
