use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use herald_channels::body::{EmbedAuthor, EmbedFooter};

/// Current unix time in seconds.
#[must_use]
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Declared style of a configured button.
///
/// Accepted and persisted for API compatibility; rendering emits every
/// button as a link button regardless (non-link styles need an interaction
/// backend to do anything when clicked).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Danger,
    #[default]
    Link,
}

/// A configured announcement button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigButton {
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub style: ButtonStyle,
}

/// The declarative, persisted description of a rich announcement.
///
/// The nested `author`/`footer` forms win over the flat legacy fields when
/// present; normalization happens at render time, both forms are stored as
/// given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncementConfig {
    pub id: String,
    pub guild_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub author: Option<EmbedAuthor>,
    pub footer: Option<EmbedFooter>,
    pub author_name: Option<String>,
    pub author_icon_url: Option<String>,
    pub footer_text: Option<String>,
    pub footer_icon_url: Option<String>,
    /// Embed timestamp, unix seconds.
    pub timestamp: Option<i64>,
    pub enabled: bool,
    pub buttons: Vec<ConfigButton>,
    pub enable_buttons: bool,
    /// Primary external message id: the first id obtained in the most
    /// recent successful pass. Kept for single-channel consumers; the
    /// per-channel truth lives in [`ChannelTarget`] rows.
    pub message_id: Option<String>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AnnouncementConfig {
    /// A new, disabled, unpublished config with a generated id and current
    /// timestamps.
    #[must_use]
    pub fn new(guild_id: impl Into<String>, created_by: impl Into<String>) -> Self {
        let now = now_secs();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            guild_id: guild_id.into(),
            title: None,
            description: None,
            color: None,
            image_url: None,
            thumbnail_url: None,
            author: None,
            footer: None,
            author_name: None,
            author_icon_url: None,
            footer_text: None,
            footer_icon_url: None,
            timestamp: None,
            enabled: false,
            buttons: Vec::new(),
            enable_buttons: false,
            message_id: None,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = now_secs();
    }
}

/// Per-channel publication record: links a config to one channel and, when
/// published, the provider-assigned message id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelTarget {
    pub config_id: String,
    pub guild_id: String,
    pub channel_id: String,
    pub message_id: Option<String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_is_disabled_and_unpublished() {
        let config = AnnouncementConfig::new("100000000000000001", "tester");
        assert!(!config.enabled);
        assert!(config.message_id.is_none());
        assert!(config.buttons.is_empty());
        assert_eq!(config.created_at, config.updated_at);
        assert_eq!(config.guild_id, "100000000000000001");
    }

    #[test]
    fn button_style_defaults_to_link() {
        let button: ConfigButton =
            serde_json::from_str(r#"{"label": "Docs", "url": "https://example.com"}"#).unwrap();
        assert_eq!(button.style, ButtonStyle::Link);
    }

    #[test]
    fn button_style_parses_lowercase() {
        let button: ConfigButton = serde_json::from_str(
            r#"{"label": "Go", "url": "https://example.com", "style": "danger"}"#,
        )
        .unwrap();
        assert_eq!(button.style, ButtonStyle::Danger);
    }
}
