//! CLI subcommands for announcement management.

use {
    anyhow::Result,
    clap::{Args, Subcommand},
};

use {
    herald_engine::{AnnouncementPatch, AnnouncementService, NewAnnouncement, PublishOutcome},
    herald_store::{ButtonStyle, ConfigButton},
};

#[derive(Subcommand)]
pub enum AnnounceAction {
    /// List announcements in a guild.
    List {
        /// Guild id.
        #[arg(long)]
        guild: String,
    },
    /// Show one announcement with its channel targets.
    Show {
        #[arg(long)]
        guild: String,
        /// Announcement id.
        id: String,
    },
    /// Create an announcement; publishes immediately with `--enabled`.
    Create(CreateArgs),
    /// Update an announcement and reconcile its live copies.
    Update(UpdateArgs),
    /// Delete an announcement and its live copies.
    Delete {
        #[arg(long)]
        guild: String,
        id: String,
    },
    /// Enable an announcement (publishes a fresh copy per channel).
    Enable {
        #[arg(long)]
        guild: String,
        id: String,
    },
    /// Disable an announcement (retires every live copy).
    Disable {
        #[arg(long)]
        guild: String,
        id: String,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    guild: String,
    /// Channel to publish to; repeatable.
    #[arg(long = "channel")]
    channels: Vec<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Embed color, `#RRGGBB` or decimal.
    #[arg(long, value_parser = parse_color)]
    color: Option<u32>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    thumbnail_url: Option<String>,
    #[arg(long)]
    author_name: Option<String>,
    #[arg(long)]
    author_icon_url: Option<String>,
    #[arg(long)]
    footer_text: Option<String>,
    #[arg(long)]
    footer_icon_url: Option<String>,
    /// Link button as `Label|https://url[|style]`; repeatable.
    #[arg(long = "button", value_parser = parse_button)]
    buttons: Vec<ConfigButton>,
    /// Publish immediately.
    #[arg(long, default_value_t = false)]
    enabled: bool,
    /// Attribution recorded on the config.
    #[arg(long, default_value = "cli")]
    created_by: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[arg(long)]
    guild: String,
    /// Announcement id.
    id: String,
    /// Replacement channel set; repeatable. Omit to keep the current set.
    #[arg(long = "channel")]
    channels: Vec<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Embed color, `#RRGGBB` or decimal.
    #[arg(long, value_parser = parse_color)]
    color: Option<u32>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    thumbnail_url: Option<String>,
    #[arg(long)]
    author_name: Option<String>,
    #[arg(long)]
    author_icon_url: Option<String>,
    #[arg(long)]
    footer_text: Option<String>,
    #[arg(long)]
    footer_icon_url: Option<String>,
    /// Replacement button set as `Label|https://url[|style]`; repeatable.
    #[arg(long = "button", value_parser = parse_button)]
    buttons: Vec<ConfigButton>,
    #[arg(long)]
    enabled: Option<bool>,
}

pub async fn handle_announce(service: &AnnouncementService, action: AnnounceAction) -> Result<()> {
    match action {
        AnnounceAction::List { guild } => {
            let configs = service.list_by_guild(&guild).await?;
            println!("{}", serde_json::to_string_pretty(&configs)?);
        },
        AnnounceAction::Show { guild, id } => match service.get(&id, &guild).await? {
            Some(config) => {
                let targets = service.targets(&id, &guild).await?;
                let view = serde_json::json!({ "config": config, "targets": targets });
                println!("{}", serde_json::to_string_pretty(&view)?);
            },
            None => eprintln!("announcement {id} not found"),
        },
        AnnounceAction::Create(args) => {
            let enable_buttons = !args.buttons.is_empty();
            let input = NewAnnouncement {
                title: args.title,
                description: args.description,
                color: args.color,
                image_url: args.image_url,
                thumbnail_url: args.thumbnail_url,
                author_name: args.author_name,
                author_icon_url: args.author_icon_url,
                footer_text: args.footer_text,
                footer_icon_url: args.footer_icon_url,
                enabled: args.enabled,
                buttons: args.buttons,
                enable_buttons,
                channels: args.channels,
                ..Default::default()
            };
            let outcome = service.create(&args.guild, &args.created_by, input).await?;
            print_outcome(&outcome)?;
        },
        AnnounceAction::Update(args) => {
            let patch = AnnouncementPatch {
                title: args.title,
                description: args.description,
                color: args.color,
                image_url: args.image_url,
                thumbnail_url: args.thumbnail_url,
                author_name: args.author_name,
                author_icon_url: args.author_icon_url,
                footer_text: args.footer_text,
                footer_icon_url: args.footer_icon_url,
                enabled: args.enabled,
                enable_buttons: (!args.buttons.is_empty()).then_some(true),
                buttons: if args.buttons.is_empty() {
                    None
                } else {
                    Some(args.buttons)
                },
                channels: if args.channels.is_empty() {
                    None
                } else {
                    Some(args.channels)
                },
                ..Default::default()
            };
            let outcome = service.update(&args.id, &args.guild, patch).await?;
            print_outcome(&outcome)?;
        },
        AnnounceAction::Delete { guild, id } => {
            service.delete(&id, &guild).await?;
            println!("announcement {id} deleted");
        },
        AnnounceAction::Enable { guild, id } => {
            let outcome = service.set_enabled(&id, &guild, true).await?;
            print_outcome(&outcome)?;
        },
        AnnounceAction::Disable { guild, id } => {
            let outcome = service.set_enabled(&id, &guild, false).await?;
            print_outcome(&outcome)?;
        },
    }
    Ok(())
}

fn print_outcome(outcome: &PublishOutcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

/// Parse `#RRGGBB` or a decimal color value.
fn parse_color(value: &str) -> Result<u32, String> {
    let raw = value.trim();
    let parsed = if let Some(hex) = raw.strip_prefix('#') {
        u32::from_str_radix(hex, 16)
    } else {
        raw.parse::<u32>()
    };
    match parsed {
        Ok(color) if color <= 0xFF_FF_FF => Ok(color),
        Ok(_) => Err(format!("color out of range: {raw}")),
        Err(e) => Err(format!("invalid color {raw}: {e}")),
    }
}

/// Parse `Label|https://url[|style]` into a configured button.
fn parse_button(value: &str) -> Result<ConfigButton, String> {
    let mut parts = value.splitn(3, '|');
    let label = parts.next().unwrap_or_default().trim();
    let url = parts.next().unwrap_or_default().trim();
    if label.is_empty() || url.is_empty() {
        return Err("expected `Label|https://url[|style]`".into());
    }
    let style = match parts.next().map(|s| s.trim().to_lowercase()) {
        None => ButtonStyle::Link,
        Some(style) => match style.as_str() {
            "primary" => ButtonStyle::Primary,
            "secondary" => ButtonStyle::Secondary,
            "danger" => ButtonStyle::Danger,
            "link" => ButtonStyle::Link,
            other => return Err(format!("unknown button style: {other}")),
        },
    };
    Ok(ConfigButton {
        label: label.to_string(),
        url: url.to_string(),
        style,
    })
}
