use std::{collections::HashMap, sync::Arc};

use {serde::Serialize, tracing::info};

use {
    herald_channels::{
        MessagingGateway,
        body::{EmbedAuthor, EmbedFooter},
        ids,
    },
    herald_store::{AnnouncementConfig, AnnouncementStore, ChannelTarget, ConfigButton},
};

use crate::{
    error::{Error, Result},
    reconcile::{self, DesiredTarget, ReconcileReport, RetiredTarget},
    render,
};

/// Input for creating a new announcement.
#[derive(Debug, Clone, Default)]
pub struct NewAnnouncement {
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
    /// Channels to publish to, in publish order.
    pub channels: Vec<String>,
}

/// Allow-listed partial update. A `None` field is left untouched; there is
/// no dynamic field injection. `channels`, when present, replaces the whole
/// desired channel set.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementPatch {
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
    pub timestamp: Option<i64>,
    pub enabled: Option<bool>,
    pub buttons: Option<Vec<ConfigButton>>,
    pub enable_buttons: Option<bool>,
    pub channels: Option<Vec<String>>,
}

/// One successfully delivered channel copy.
#[derive(Debug, Clone, Serialize)]
pub struct SentMessage {
    pub guild_id: String,
    pub channel_id: String,
    pub message_id: String,
}

/// Result of a create/update/toggle operation.
///
/// A partially failed fan-out still reports `success: true` because the
/// declarative config was saved; the failed channels are enumerated in
/// `warning`. Re-issuing the operation retries only what is still stale.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub success: bool,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub sent_messages: Vec<SentMessage>,
}

/// Public operations over announcements: thin orchestration of store,
/// renderer and reconciliation passes.
///
/// Concurrent operations on the same config are not serialized here; the
/// last writer wins at the store's transaction boundary.
pub struct AnnouncementService {
    store: Arc<dyn AnnouncementStore>,
    gateway: Arc<dyn MessagingGateway>,
}

impl AnnouncementService {
    pub fn new(store: Arc<dyn AnnouncementStore>, gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { store, gateway }
    }

    /// Persist a new announcement and, when enabled, publish it to every
    /// listed channel.
    pub async fn create(
        &self,
        guild_id: &str,
        created_by: &str,
        input: NewAnnouncement,
    ) -> Result<PublishOutcome> {
        validate_guild_id(guild_id)?;
        validate_channel_ids(&input.channels)?;
        let channels = dedup_channels(&input.channels);
        for channel_id in &channels {
            self.verify_channel(guild_id, channel_id).await?;
        }

        let mut config = AnnouncementConfig::new(guild_id, created_by);
        config.title = input.title;
        config.description = input.description;
        config.color = input.color;
        config.image_url = input.image_url;
        config.thumbnail_url = input.thumbnail_url;
        config.author = input.author;
        config.footer = input.footer;
        config.author_name = input.author_name;
        config.author_icon_url = input.author_icon_url;
        config.footer_text = input.footer_text;
        config.footer_icon_url = input.footer_icon_url;
        config.timestamp = input.timestamp;
        config.enabled = input.enabled;
        config.buttons = input.buttons;
        config.enable_buttons = input.enable_buttons;

        self.store.create(&config).await?;
        self.store
            .replace_targets(&config.id, &unpublished_targets(&config, &channels))
            .await?;

        if config.enabled && !channels.is_empty() {
            let desired = channels
                .iter()
                .map(|channel_id| DesiredTarget {
                    channel_id: channel_id.clone(),
                    prior_message_id: None,
                })
                .collect::<Vec<_>>();
            let report = self.run_and_persist(&config, desired, Vec::new()).await?;
            info!(
                config_id = %config.id,
                guild_id,
                attempted = report.attempted,
                failed = report.failed_channels().len(),
                "announcement created and published"
            );
            return Ok(outcome_from_report(&config, &report, "announcement created"));
        }

        info!(config_id = %config.id, guild_id, "announcement created");
        Ok(quiet_outcome(&config, "announcement created"))
    }

    /// Apply a patch and reconcile the live copies with the new desired
    /// state: edit where possible, send where new, retire what left the
    /// set.
    pub async fn update(
        &self,
        id: &str,
        guild_id: &str,
        patch: AnnouncementPatch,
    ) -> Result<PublishOutcome> {
        validate_guild_id(guild_id)?;
        if let Some(channels) = &patch.channels {
            validate_channel_ids(channels)?;
        }

        let mut config = self.require(id, guild_id).await?;
        let prior_targets = self.store.targets(id).await?;
        let prior_ids: HashMap<&str, &str> = prior_targets
            .iter()
            .filter_map(|t| {
                t.message_id
                    .as_deref()
                    .map(|m| (t.channel_id.as_str(), m))
            })
            .collect();

        let channels = match &patch.channels {
            Some(channels) => dedup_channels(channels),
            None => prior_targets.iter().map(|t| t.channel_id.clone()).collect(),
        };
        for channel_id in &channels {
            if !prior_targets.iter().any(|t| &t.channel_id == channel_id) {
                self.verify_channel(guild_id, channel_id).await?;
            }
        }

        apply_patch(&mut config, patch);
        config.touch();
        self.store.update(&config).await?;

        if !config.enabled {
            self.retire_and_clear(&config, &prior_targets, &channels)
                .await?;
            config.message_id = None;
            info!(config_id = id, guild_id, "announcement updated while disabled");
            return Ok(quiet_outcome(&config, "announcement updated"));
        }

        let desired = channels
            .iter()
            .map(|channel_id| DesiredTarget {
                channel_id: channel_id.clone(),
                prior_message_id: prior_ids.get(channel_id.as_str()).map(|m| (*m).to_string()),
            })
            .collect::<Vec<_>>();
        let retired = prior_targets
            .iter()
            .filter(|t| !channels.contains(&t.channel_id))
            .filter_map(|t| {
                t.message_id.as_ref().map(|message_id| RetiredTarget {
                    channel_id: t.channel_id.clone(),
                    message_id: message_id.clone(),
                })
            })
            .collect::<Vec<_>>();

        let report = self.run_and_persist(&config, desired, retired).await?;
        info!(
            config_id = id,
            guild_id,
            attempted = report.attempted,
            failed = report.failed_channels().len(),
            "announcement updated"
        );
        Ok(outcome_from_report(&config, &report, "announcement updated"))
    }

    /// Best-effort delete of every live copy, then remove the config and
    /// its targets in one transaction.
    pub async fn delete(&self, id: &str, guild_id: &str) -> Result<()> {
        validate_guild_id(guild_id)?;
        let _ = self.require(id, guild_id).await?;
        let targets = self.store.targets(id).await?;
        let retired = published_targets(&targets);

        reconcile::retire_messages(self.gateway.as_ref(), &retired).await;
        self.store.delete(id, guild_id).await?;
        info!(config_id = id, guild_id, retired = retired.len(), "announcement deleted");
        Ok(())
    }

    /// Toggle an announcement. Turning it off retires every live copy and
    /// clears all ids while keeping the configured channel set; turning it
    /// on publishes a fresh copy per configured channel; a pre-disable
    /// message id is never reused.
    pub async fn set_enabled(
        &self,
        id: &str,
        guild_id: &str,
        enabled: bool,
    ) -> Result<PublishOutcome> {
        validate_guild_id(guild_id)?;
        let mut config = self.require(id, guild_id).await?;
        if config.enabled == enabled {
            return Ok(quiet_outcome(
                &config,
                if enabled {
                    "announcement already enabled"
                } else {
                    "announcement already disabled"
                },
            ));
        }

        config.enabled = enabled;
        config.touch();
        self.store.update(&config).await?;

        let targets = self.store.targets(id).await?;
        let channels: Vec<String> = targets.iter().map(|t| t.channel_id.clone()).collect();

        if !enabled {
            self.retire_and_clear(&config, &targets, &channels).await?;
            config.message_id = None;
            info!(config_id = id, guild_id, "announcement disabled");
            return Ok(quiet_outcome(&config, "announcement disabled"));
        }

        let desired = channels
            .iter()
            .map(|channel_id| DesiredTarget {
                channel_id: channel_id.clone(),
                prior_message_id: None,
            })
            .collect::<Vec<_>>();
        let report = self.run_and_persist(&config, desired, Vec::new()).await?;
        info!(
            config_id = id,
            guild_id,
            attempted = report.attempted,
            failed = report.failed_channels().len(),
            "announcement enabled"
        );
        Ok(outcome_from_report(&config, &report, "announcement enabled"))
    }

    pub async fn get(&self, id: &str, guild_id: &str) -> Result<Option<AnnouncementConfig>> {
        validate_guild_id(guild_id)?;
        Ok(self.store.get(id, guild_id).await?)
    }

    pub async fn list_by_guild(&self, guild_id: &str) -> Result<Vec<AnnouncementConfig>> {
        validate_guild_id(guild_id)?;
        Ok(self.store.list_by_guild(guild_id).await?)
    }

    /// Target rows for an announcement this guild owns.
    pub async fn targets(&self, id: &str, guild_id: &str) -> Result<Vec<ChannelTarget>> {
        validate_guild_id(guild_id)?;
        let _ = self.require(id, guild_id).await?;
        Ok(self.store.targets(id).await?)
    }

    async fn require(&self, id: &str, guild_id: &str) -> Result<AnnouncementConfig> {
        self.store
            .get(id, guild_id)
            .await?
            .ok_or_else(|| Error::not_found(id))
    }

    /// Confirm a channel exists and belongs to this guild before it enters
    /// the configured set. Provider "not found" is a validation failure
    /// here, not a recoverable delivery condition.
    async fn verify_channel(&self, guild_id: &str, channel_id: &str) -> Result<()> {
        let info = self
            .gateway
            .fetch_channel(guild_id, channel_id)
            .await
            .map_err(|e| match e {
                herald_channels::Error::Gateway { .. } => Error::Gateway(e),
                _ => Error::validation(format!("channel {channel_id}: {e}")),
            })?;
        match info.guild_id.as_deref() {
            Some(owner) if owner != guild_id => Err(Error::validation(format!(
                "channel {channel_id} belongs to another guild"
            ))),
            _ => Ok(()),
        }
    }

    /// Run one pass and persist every successful `(channel, id)` pair.
    /// Sibling failures end up in the report but never block the persist.
    /// The primary id is refreshed only when the pass delivered something.
    async fn run_and_persist(
        &self,
        config: &AnnouncementConfig,
        desired: Vec<DesiredTarget>,
        retired: Vec<RetiredTarget>,
    ) -> Result<ReconcileReport> {
        let body = render(config);
        let report =
            reconcile::reconcile_pass(self.gateway.as_ref(), &body, &desired, &retired).await;

        let targets: Vec<ChannelTarget> = report
            .per_channel
            .iter()
            .map(|r| ChannelTarget {
                config_id: config.id.clone(),
                guild_id: config.guild_id.clone(),
                channel_id: r.channel_id.clone(),
                message_id: r.message_id.clone(),
            })
            .collect();
        self.store.replace_targets(&config.id, &targets).await?;
        if report.first_success_id.is_some() {
            self.store
                .set_primary_message_id(&config.id, report.first_success_id.as_deref())
                .await?;
        }
        Ok(report)
    }

    /// Retire every live copy and persist the kept channel set with all
    /// ids cleared.
    async fn retire_and_clear(
        &self,
        config: &AnnouncementConfig,
        prior_targets: &[ChannelTarget],
        keep_channels: &[String],
    ) -> Result<()> {
        let retired = published_targets(prior_targets);
        reconcile::retire_messages(self.gateway.as_ref(), &retired).await;
        self.store
            .replace_targets(&config.id, &unpublished_targets(config, keep_channels))
            .await?;
        self.store.set_primary_message_id(&config.id, None).await?;
        Ok(())
    }
}

fn validate_guild_id(guild_id: &str) -> Result<()> {
    if ids::is_snowflake(guild_id) {
        Ok(())
    } else {
        Err(Error::validation(format!("malformed guild id: {guild_id}")))
    }
}

fn validate_channel_ids(channels: &[String]) -> Result<()> {
    for channel_id in channels {
        if !ids::is_snowflake(channel_id) {
            return Err(Error::validation(format!(
                "malformed channel id: {channel_id}"
            )));
        }
    }
    Ok(())
}

/// Deduplicate while preserving first-seen order, so each channel is
/// attempted exactly once per pass.
fn dedup_channels(channels: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(channels.len());
    for channel_id in channels {
        if !seen.contains(channel_id) {
            seen.push(channel_id.clone());
        }
    }
    seen
}

fn unpublished_targets(config: &AnnouncementConfig, channels: &[String]) -> Vec<ChannelTarget> {
    channels
        .iter()
        .map(|channel_id| ChannelTarget {
            config_id: config.id.clone(),
            guild_id: config.guild_id.clone(),
            channel_id: channel_id.clone(),
            message_id: None,
        })
        .collect()
}

fn published_targets(targets: &[ChannelTarget]) -> Vec<RetiredTarget> {
    targets
        .iter()
        .filter_map(|t| {
            t.message_id.as_ref().map(|message_id| RetiredTarget {
                channel_id: t.channel_id.clone(),
                message_id: message_id.clone(),
            })
        })
        .collect()
}

fn apply_patch(config: &mut AnnouncementConfig, patch: AnnouncementPatch) {
    if let Some(title) = patch.title {
        config.title = Some(title);
    }
    if let Some(description) = patch.description {
        config.description = Some(description);
    }
    if let Some(color) = patch.color {
        config.color = Some(color);
    }
    if let Some(image_url) = patch.image_url {
        config.image_url = Some(image_url);
    }
    if let Some(thumbnail_url) = patch.thumbnail_url {
        config.thumbnail_url = Some(thumbnail_url);
    }
    if let Some(author) = patch.author {
        config.author = Some(author);
    }
    if let Some(footer) = patch.footer {
        config.footer = Some(footer);
    }
    if let Some(author_name) = patch.author_name {
        config.author_name = Some(author_name);
    }
    if let Some(author_icon_url) = patch.author_icon_url {
        config.author_icon_url = Some(author_icon_url);
    }
    if let Some(footer_text) = patch.footer_text {
        config.footer_text = Some(footer_text);
    }
    if let Some(footer_icon_url) = patch.footer_icon_url {
        config.footer_icon_url = Some(footer_icon_url);
    }
    if let Some(timestamp) = patch.timestamp {
        config.timestamp = Some(timestamp);
    }
    if let Some(enabled) = patch.enabled {
        config.enabled = enabled;
    }
    if let Some(buttons) = patch.buttons {
        config.buttons = buttons;
    }
    if let Some(enable_buttons) = patch.enable_buttons {
        config.enable_buttons = enable_buttons;
    }
}

fn outcome_from_report(
    config: &AnnouncementConfig,
    report: &ReconcileReport,
    message: &str,
) -> PublishOutcome {
    let sent_messages = report
        .delivered()
        .into_iter()
        .map(|(channel_id, message_id)| SentMessage {
            guild_id: config.guild_id.clone(),
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        })
        .collect();
    let failed = report.failed_channels();
    let warning = if failed.is_empty() {
        None
    } else {
        Some(format!(
            "delivery failed for {} channel(s): {}",
            failed.len(),
            failed.join(", ")
        ))
    };
    PublishOutcome {
        success: true,
        id: config.id.clone(),
        message_id: report.first_success_id.clone(),
        message: message.to_string(),
        warning,
        sent_messages,
    }
}

fn quiet_outcome(config: &AnnouncementConfig, message: &str) -> PublishOutcome {
    PublishOutcome {
        success: true,
        id: config.id.clone(),
        message_id: config.message_id.clone(),
        message: message.to_string(),
        warning: None,
        sent_messages: Vec::new(),
    }
}
