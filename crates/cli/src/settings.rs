//! CLI configuration: a small TOML file plus environment overrides.

use std::path::{Path, PathBuf};

use {anyhow::Context, secrecy::Secret, serde::Deserialize, sqlx::SqlitePool};

use herald_discord::DiscordAccountConfig;

#[derive(Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file.
    pub database_path: PathBuf,
    pub discord: DiscordAccountConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("herald.db"),
            discord: DiscordAccountConfig::default(),
        }
    }
}

/// Load settings from `path` when it exists, falling back to defaults.
/// `DISCORD_TOKEN` in the environment overrides the configured token.
pub fn load(path: &Path) -> anyhow::Result<Settings> {
    let mut settings: Settings = if path.exists() {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
    } else {
        Settings::default()
    };

    if let Ok(token) = std::env::var("DISCORD_TOKEN") {
        settings.discord.token = Secret::new(token);
    }

    Ok(settings)
}

/// Open (and create if needed) the SQLite database.
pub async fn open_pool(settings: &Settings) -> anyhow::Result<SqlitePool> {
    let url = format!("sqlite://{}?mode=rwc", settings.database_path.display());
    SqlitePool::connect(&url)
        .await
        .with_context(|| format!("opening {}", settings.database_path.display()))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {secrecy::ExposeSecret, std::io::Write};

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = load(Path::new("/nonexistent/herald.toml")).unwrap();
        assert_eq!(settings.database_path, PathBuf::from("herald.db"));
    }

    #[test]
    fn parses_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "database_path = \"/tmp/announcements.db\"\n\n[discord]\ntoken = \"bot-token\""
        )
        .unwrap();

        let settings = load(&path).unwrap();
        assert_eq!(settings.database_path, PathBuf::from("/tmp/announcements.db"));
        assert_eq!(settings.discord.token.expose_secret(), "bot-token");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        std::fs::write(&path, "[discord]\ntoken = \"t\"\n").unwrap();

        let settings = load(&path).unwrap();
        assert_eq!(settings.database_path, PathBuf::from("herald.db"));
    }
}
