//! Discord REST adapter for herald.
//!
//! Implements the messaging gateway contract with serenity's HTTP client:
//! embeds plus link-button rows out, provider message ids back. No gateway
//! connection is held; announcements only need the REST surface.

pub mod config;
pub mod gateway;

pub use {config::DiscordAccountConfig, gateway::DiscordGateway};
