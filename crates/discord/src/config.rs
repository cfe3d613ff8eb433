use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::gateway::DiscordGateway;

/// Configuration for the Discord bot account used to publish
/// announcements.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordAccountConfig {
    /// Bot token from the Discord developer portal.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
}

impl DiscordAccountConfig {
    /// Build the REST gateway for this account.
    #[must_use]
    pub fn gateway(&self) -> DiscordGateway {
        DiscordGateway::new(self.token.expose_secret())
    }
}

impl std::fmt::Debug for DiscordAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordAccountConfig")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Default for DiscordAccountConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_from_json() {
        let cfg: DiscordAccountConfig =
            serde_json::from_str(r#"{"token": "bot-token"}"#).unwrap();
        assert_eq!(cfg.token.expose_secret(), "bot-token");
    }

    #[test]
    fn debug_redacts_the_token() {
        let cfg: DiscordAccountConfig =
            serde_json::from_str(r#"{"token": "bot-token"}"#).unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("bot-token"));
        assert!(debug.contains("REDACTED"));
    }
}
