mod announce_commands;
mod settings;

use std::sync::Arc;

use {
    clap::{Parser, Subcommand},
    herald_engine::AnnouncementService,
    herald_store::SqliteAnnouncementStore,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "herald", about = "Herald — Discord announcement synchronization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Path to the herald config file.
    #[arg(long, global = true, env = "HERALD_CONFIG", default_value = "herald.toml")]
    config: std::path::PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Announcement management.
    Announce {
        #[command(subcommand)]
        action: announce_commands::AnnounceAction,
    },
    /// Database management.
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Create the announcement tables if they do not exist.
    Init,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let settings = settings::load(&cli.config)?;
    let pool = settings::open_pool(&settings).await?;
    SqliteAnnouncementStore::init(&pool).await?;

    match cli.command {
        Commands::Db {
            action: DbAction::Init,
        } => {
            info!(path = %settings.database_path.display(), "database initialized");
            println!("database ready at {}", settings.database_path.display());
        },
        Commands::Announce { action } => {
            let store = Arc::new(SqliteAnnouncementStore::new(pool));
            let gateway = Arc::new(settings.discord.gateway());
            let service = AnnouncementService::new(store, gateway);
            announce_commands::handle_announce(&service, action).await?;
        },
    }

    Ok(())
}
