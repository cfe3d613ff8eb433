//! Messaging boundary shared across the herald crates.
//!
//! Platform-neutral message body types, the `MessagingGateway` contract the
//! reconciliation engine drives, provider id validation, and the typed
//! errors that cross this boundary.

pub mod body;
pub mod error;
pub mod gateway;
pub mod ids;

pub use {
    body::{EmbedAuthor, EmbedBody, EmbedFooter, LinkButton, MessageBody},
    error::{Error, Result},
    gateway::{ChannelInfo, MessagingGateway},
};
