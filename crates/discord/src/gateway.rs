use std::sync::Arc;

use {
    serenity::{
        all::{
            Channel, ChannelId, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedAuthor,
            CreateEmbedFooter, CreateMessage, EditMessage, MessageId, Timestamp,
        },
        http::{Http, HttpError},
    },
    tracing::{debug, info},
};

use {
    async_trait::async_trait,
    herald_channels::{ChannelInfo, Error, MessageBody, MessagingGateway, Result},
};

/// Discord REST implementation of the messaging gateway.
///
/// Holds only an HTTP client; no gateway shard, no cache. Provider 404s are
/// surfaced as [`Error::NotFound`] so the engine can resend or treat a
/// delete as already done.
pub struct DiscordGateway {
    http: Arc<Http>,
}

impl DiscordGateway {
    /// Build a gateway from a bot token.
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            http: Arc::new(Http::new(token)),
        }
    }

    /// Reuse an existing serenity HTTP client.
    #[must_use]
    pub fn from_http(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MessagingGateway for DiscordGateway {
    async fn fetch_channel(&self, guild_id: &str, channel_id: &str) -> Result<ChannelInfo> {
        let id = parse_channel_id(channel_id)?;
        let channel = self
            .http
            .get_channel(id)
            .await
            .map_err(|e| classify("fetch channel", "channel", channel_id, e))?;

        let info = match channel {
            Channel::Guild(guild_channel) => ChannelInfo {
                id: guild_channel.id.to_string(),
                guild_id: Some(guild_channel.guild_id.to_string()),
                name: Some(guild_channel.name.clone()),
            },
            Channel::Private(private) => ChannelInfo {
                id: private.id.to_string(),
                guild_id: None,
                name: None,
            },
            _ => ChannelInfo {
                id: channel_id.to_string(),
                guild_id: None,
                name: None,
            },
        };
        debug!(guild_id, channel_id, "fetched channel");
        Ok(info)
    }

    async fn send_message(&self, channel_id: &str, body: &MessageBody) -> Result<String> {
        let id = parse_channel_id(channel_id)?;
        let mut message = CreateMessage::new().embed(build_embed(body));
        let components = build_components(body);
        if !components.is_empty() {
            message = message.components(components);
        }

        let sent = id
            .send_message(&self.http, message)
            .await
            .map_err(|e| classify("send message", "channel", channel_id, e))?;
        info!(channel_id, message_id = %sent.id, "announcement message sent");
        Ok(sent.id.to_string())
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        body: &MessageBody,
    ) -> Result<()> {
        let channel = parse_channel_id(channel_id)?;
        let message = parse_message_id(message_id)?;
        // Components are always set so an edit can drop a stale button row.
        let edit = EditMessage::new()
            .embed(build_embed(body))
            .components(build_components(body));

        channel
            .edit_message(&self.http, message, edit)
            .await
            .map_err(|e| classify("edit message", "message", message_id, e))?;
        info!(channel_id, message_id, "announcement message edited");
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let channel = parse_channel_id(channel_id)?;
        let message = parse_message_id(message_id)?;

        channel
            .delete_message(&self.http, message)
            .await
            .map_err(|e| classify("delete message", "message", message_id, e))?;
        debug!(channel_id, message_id, "announcement message deleted");
        Ok(())
    }
}

fn parse_channel_id(value: &str) -> Result<ChannelId> {
    match value.parse::<u64>() {
        Ok(raw) if raw != 0 => Ok(ChannelId::new(raw)),
        _ => Err(Error::invalid_id("channel", value)),
    }
}

fn parse_message_id(value: &str) -> Result<MessageId> {
    match value.parse::<u64>() {
        Ok(raw) if raw != 0 => Ok(MessageId::new(raw)),
        _ => Err(Error::invalid_id("message", value)),
    }
}

/// Whether a serenity error is a 404 from the REST API.
fn is_not_found(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

fn classify(
    context: &'static str,
    entity: &'static str,
    id: &str,
    error: serenity::Error,
) -> Error {
    if is_not_found(&error) {
        Error::not_found(entity, id)
    } else {
        Error::gateway(context, error)
    }
}

fn build_embed(body: &MessageBody) -> CreateEmbed {
    let source = &body.embed;
    let mut embed = CreateEmbed::new();
    if let Some(title) = &source.title {
        embed = embed.title(title);
    }
    if let Some(description) = &source.description {
        embed = embed.description(description);
    }
    if let Some(color) = source.color {
        embed = embed.colour(color);
    }
    if let Some(image_url) = &source.image_url {
        embed = embed.image(image_url);
    }
    if let Some(thumbnail_url) = &source.thumbnail_url {
        embed = embed.thumbnail(thumbnail_url);
    }
    if let Some(author) = &source.author {
        let mut builder = CreateEmbedAuthor::new(&author.name);
        if let Some(icon_url) = &author.icon_url {
            builder = builder.icon_url(icon_url);
        }
        embed = embed.author(builder);
    }
    if let Some(footer) = &source.footer {
        let mut builder = CreateEmbedFooter::new(&footer.text);
        if let Some(icon_url) = &footer.icon_url {
            builder = builder.icon_url(icon_url);
        }
        embed = embed.footer(builder);
    }
    if let Some(timestamp) = source.timestamp {
        if let Ok(timestamp) = Timestamp::from_unix_timestamp(timestamp) {
            embed = embed.timestamp(timestamp);
        }
    }
    embed
}

/// Link-button rows, five buttons per row (the provider's cap).
fn build_components(body: &MessageBody) -> Vec<CreateActionRow> {
    body.buttons
        .chunks(5)
        .map(|chunk| {
            CreateActionRow::Buttons(
                chunk
                    .iter()
                    .map(|b| CreateButton::new_link(&b.url).label(&b.label))
                    .collect(),
            )
        })
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use herald_channels::body::{EmbedAuthor, EmbedBody, EmbedFooter, LinkButton};

    use super::*;

    fn button(n: usize) -> LinkButton {
        LinkButton {
            label: format!("Button {n}"),
            url: format!("https://example.com/{n}"),
        }
    }

    #[test]
    fn channel_id_parsing_rejects_bad_values() {
        assert!(parse_channel_id("200000000000000001").is_ok());
        assert!(parse_channel_id("general").is_err());
        assert!(parse_channel_id("0").is_err());
        assert!(parse_channel_id("-5").is_err());
        assert!(parse_channel_id("").is_err());
    }

    #[test]
    fn buttons_are_chunked_into_rows_of_five() {
        let body = MessageBody {
            embed: EmbedBody::default(),
            buttons: (0..7).map(button).collect(),
        };

        let rows = build_components(&body);
        assert_eq!(rows.len(), 2);
        let lens: Vec<usize> = rows
            .iter()
            .map(|row| match row {
                CreateActionRow::Buttons(buttons) => buttons.len(),
                _ => 0,
            })
            .collect();
        assert_eq!(lens, [5, 2]);
    }

    #[test]
    fn no_buttons_means_no_rows() {
        let body = MessageBody::default();
        assert!(build_components(&body).is_empty());
    }

    #[test]
    fn embed_carries_content_fields() {
        let body = MessageBody {
            embed: EmbedBody {
                title: Some("Release day".into()),
                description: Some("v2 is out".into()),
                author: Some(EmbedAuthor {
                    name: "The Team".into(),
                    icon_url: None,
                }),
                footer: Some(EmbedFooter {
                    text: "posted by herald".into(),
                    icon_url: None,
                }),
                ..Default::default()
            },
            buttons: Vec::new(),
        };

        let value = serde_json::to_value(build_embed(&body)).unwrap();
        assert_eq!(value["title"], "Release day");
        assert_eq!(value["description"], "v2 is out");
        assert_eq!(value["author"]["name"], "The Team");
        assert_eq!(value["footer"]["text"], "posted by herald");
    }
}
