use {
    herald_channels::body::{EmbedAuthor, EmbedBody, EmbedFooter, LinkButton, MessageBody},
    herald_store::AnnouncementConfig,
};

/// Render a stored config into a platform-neutral message body.
///
/// Pure and infallible: absent optional fields are simply omitted. The
/// nested author/footer forms win over the flat legacy fields, per field,
/// only when present. The button row is emitted iff buttons are enabled and
/// configured, and every button comes out as a link button; the declared
/// style is dropped here.
#[must_use]
pub fn render(config: &AnnouncementConfig) -> MessageBody {
    let author_name = config
        .author
        .as_ref()
        .map(|a| a.name.clone())
        .or_else(|| config.author_name.clone());
    let author_icon_url = config
        .author
        .as_ref()
        .and_then(|a| a.icon_url.clone())
        .or_else(|| config.author_icon_url.clone());
    let footer_text = config
        .footer
        .as_ref()
        .map(|f| f.text.clone())
        .or_else(|| config.footer_text.clone());
    let footer_icon_url = config
        .footer
        .as_ref()
        .and_then(|f| f.icon_url.clone())
        .or_else(|| config.footer_icon_url.clone());

    let embed = EmbedBody {
        title: config.title.clone(),
        description: config.description.clone(),
        color: config.color,
        image_url: config.image_url.clone(),
        thumbnail_url: config.thumbnail_url.clone(),
        author: author_name.map(|name| EmbedAuthor {
            name,
            icon_url: author_icon_url,
        }),
        footer: footer_text.map(|text| EmbedFooter {
            text,
            icon_url: footer_icon_url,
        }),
        timestamp: config.timestamp,
    };

    let buttons = if config.enable_buttons {
        config
            .buttons
            .iter()
            .map(|b| LinkButton {
                label: b.label.clone(),
                url: b.url.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    MessageBody { embed, buttons }
}
