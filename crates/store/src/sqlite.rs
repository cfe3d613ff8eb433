use {serde::Serialize, sqlx::SqlitePool};

use herald_channels::body::{EmbedAuthor, EmbedFooter};

use crate::{
    AnnouncementStore,
    error::{Error, Result},
    types::{AnnouncementConfig, ChannelTarget, ConfigButton},
};

use async_trait::async_trait;

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct ConfigRow {
    id: String,
    guild_id: String,
    title: Option<String>,
    description: Option<String>,
    color: Option<i64>,
    image_url: Option<String>,
    thumbnail_url: Option<String>,
    author: Option<String>,
    footer: Option<String>,
    author_name: Option<String>,
    author_icon_url: Option<String>,
    footer_text: Option<String>,
    footer_icon_url: Option<String>,
    timestamp: Option<i64>,
    enabled: i32,
    buttons: String,
    enable_buttons: i32,
    message_id: Option<String>,
    created_by: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ConfigRow> for AnnouncementConfig {
    type Error = Error;

    fn try_from(r: ConfigRow) -> Result<Self> {
        let author: Option<EmbedAuthor> = r
            .author
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let footer: Option<EmbedFooter> = r
            .footer
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let buttons: Vec<ConfigButton> = serde_json::from_str(&r.buttons)?;
        Ok(Self {
            id: r.id,
            guild_id: r.guild_id,
            title: r.title,
            description: r.description,
            color: r.color.map(|c| c as u32),
            image_url: r.image_url,
            thumbnail_url: r.thumbnail_url,
            author,
            footer,
            author_name: r.author_name,
            author_icon_url: r.author_icon_url,
            footer_text: r.footer_text,
            footer_icon_url: r.footer_icon_url,
            timestamp: r.timestamp,
            enabled: r.enabled != 0,
            buttons,
            enable_buttons: r.enable_buttons != 0,
            message_id: r.message_id,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TargetRow {
    config_id: String,
    guild_id: String,
    channel_id: String,
    message_id: Option<String>,
}

impl From<TargetRow> for ChannelTarget {
    fn from(r: TargetRow) -> Self {
        Self {
            config_id: r.config_id,
            guild_id: r.guild_id,
            channel_id: r.channel_id,
            message_id: r.message_id,
        }
    }
}

fn json_opt<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(serde_json::to_string).transpose().map_err(Into::into)
}

/// SQLite-backed announcement store.
pub struct SqliteAnnouncementStore {
    pool: SqlitePool,
}

impl SqliteAnnouncementStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the announcement tables.
    ///
    /// Idempotent; called at startup and by tests using in-memory
    /// databases.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS announcement_configs (
                id              TEXT    PRIMARY KEY,
                guild_id        TEXT    NOT NULL,
                title           TEXT,
                description     TEXT,
                color           INTEGER,
                image_url       TEXT,
                thumbnail_url   TEXT,
                author          TEXT,
                footer          TEXT,
                author_name     TEXT,
                author_icon_url TEXT,
                footer_text     TEXT,
                footer_icon_url TEXT,
                timestamp       INTEGER,
                enabled         INTEGER NOT NULL DEFAULT 0,
                buttons         TEXT    NOT NULL DEFAULT '[]',
                enable_buttons  INTEGER NOT NULL DEFAULT 0,
                message_id      TEXT,
                created_by      TEXT    NOT NULL,
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS channel_targets (
                config_id  TEXT NOT NULL REFERENCES announcement_configs(id),
                guild_id   TEXT NOT NULL,
                channel_id TEXT NOT NULL,
                message_id TEXT,
                PRIMARY KEY (config_id, channel_id)
            )"#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_announcement_configs_guild
             ON announcement_configs(guild_id)",
        )
        .execute(pool)
        .await
        .ok();

        Ok(())
    }
}

#[async_trait]
impl AnnouncementStore for SqliteAnnouncementStore {
    async fn create(&self, config: &AnnouncementConfig) -> Result<()> {
        let author = json_opt(config.author.as_ref())?;
        let footer = json_opt(config.footer.as_ref())?;
        let buttons = serde_json::to_string(&config.buttons)?;
        sqlx::query(
            r#"INSERT INTO announcement_configs (
                 id, guild_id, title, description, color, image_url,
                 thumbnail_url, author, footer, author_name, author_icon_url,
                 footer_text, footer_icon_url, timestamp, enabled, buttons,
                 enable_buttons, message_id, created_by, created_at, updated_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&config.id)
        .bind(&config.guild_id)
        .bind(&config.title)
        .bind(&config.description)
        .bind(config.color.map(i64::from))
        .bind(&config.image_url)
        .bind(&config.thumbnail_url)
        .bind(author)
        .bind(footer)
        .bind(&config.author_name)
        .bind(&config.author_icon_url)
        .bind(&config.footer_text)
        .bind(&config.footer_icon_url)
        .bind(config.timestamp)
        .bind(i32::from(config.enabled))
        .bind(buttons)
        .bind(i32::from(config.enable_buttons))
        .bind(&config.message_id)
        .bind(&config.created_by)
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, config: &AnnouncementConfig) -> Result<()> {
        let author = json_opt(config.author.as_ref())?;
        let footer = json_opt(config.footer.as_ref())?;
        let buttons = serde_json::to_string(&config.buttons)?;
        sqlx::query(
            r#"UPDATE announcement_configs SET
                 title = ?, description = ?, color = ?, image_url = ?,
                 thumbnail_url = ?, author = ?, footer = ?, author_name = ?,
                 author_icon_url = ?, footer_text = ?, footer_icon_url = ?,
                 timestamp = ?, enabled = ?, buttons = ?, enable_buttons = ?,
                 updated_at = ?
               WHERE id = ? AND guild_id = ?"#,
        )
        .bind(&config.title)
        .bind(&config.description)
        .bind(config.color.map(i64::from))
        .bind(&config.image_url)
        .bind(&config.thumbnail_url)
        .bind(author)
        .bind(footer)
        .bind(&config.author_name)
        .bind(&config.author_icon_url)
        .bind(&config.footer_text)
        .bind(&config.footer_icon_url)
        .bind(config.timestamp)
        .bind(i32::from(config.enabled))
        .bind(buttons)
        .bind(i32::from(config.enable_buttons))
        .bind(config.updated_at)
        .bind(&config.id)
        .bind(&config.guild_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: &str, guild_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM channel_targets WHERE config_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM announcement_configs WHERE id = ? AND guild_id = ?")
            .bind(id)
            .bind(guild_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &str, guild_id: &str) -> Result<Option<AnnouncementConfig>> {
        let row = sqlx::query_as::<_, ConfigRow>(
            "SELECT * FROM announcement_configs WHERE id = ? AND guild_id = ?",
        )
        .bind(id)
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_by_guild(&self, guild_id: &str) -> Result<Vec<AnnouncementConfig>> {
        let rows = sqlx::query_as::<_, ConfigRow>(
            "SELECT * FROM announcement_configs WHERE guild_id = ? ORDER BY updated_at DESC",
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn targets(&self, config_id: &str) -> Result<Vec<ChannelTarget>> {
        let rows = sqlx::query_as::<_, TargetRow>(
            "SELECT config_id, guild_id, channel_id, message_id
             FROM channel_targets WHERE config_id = ? ORDER BY rowid",
        )
        .bind(config_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn replace_targets(&self, config_id: &str, targets: &[ChannelTarget]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM channel_targets WHERE config_id = ?")
            .bind(config_id)
            .execute(&mut *tx)
            .await?;
        for target in targets {
            sqlx::query(
                "INSERT INTO channel_targets (config_id, guild_id, channel_id, message_id)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(config_id)
            .bind(&target.guild_id)
            .bind(&target.channel_id)
            .bind(&target.message_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn set_primary_message_id(
        &self,
        config_id: &str,
        message_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE announcement_configs SET message_id = ? WHERE id = ?")
            .bind(message_id)
            .bind(config_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: &str = "100000000000000001";
    const CH1: &str = "200000000000000001";
    const CH2: &str = "200000000000000002";

    async fn test_store() -> SqliteAnnouncementStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        SqliteAnnouncementStore::init(&pool).await.unwrap();
        SqliteAnnouncementStore::new(pool)
    }

    fn sample_config() -> AnnouncementConfig {
        let mut config = AnnouncementConfig::new(GUILD, "tester");
        config.title = Some("Release day".into());
        config.description = Some("v2 is out".into());
        config.color = Some(0x5865F2);
        config.author = Some(EmbedAuthor {
            name: "The Team".into(),
            icon_url: None,
        });
        config.buttons = vec![ConfigButton {
            label: "Changelog".into(),
            url: "https://example.com/changelog".into(),
            style: crate::types::ButtonStyle::Link,
        }];
        config.enable_buttons = true;
        config.enabled = true;
        config
    }

    fn target(config_id: &str, channel_id: &str, message_id: Option<&str>) -> ChannelTarget {
        ChannelTarget {
            config_id: config_id.into(),
            guild_id: GUILD.into(),
            channel_id: channel_id.into(),
            message_id: message_id.map(Into::into),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let store = test_store().await;
        let config = sample_config();
        store.create(&config).await.unwrap();

        let got = store.get(&config.id, GUILD).await.unwrap().unwrap();
        assert_eq!(got, config);
    }

    #[tokio::test]
    async fn test_get_wrong_guild_returns_none() {
        let store = test_store().await;
        let config = sample_config();
        store.create(&config).await.unwrap();

        let got = store.get(&config.id, "100000000000000002").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_update_rewrites_content_but_not_attribution() {
        let store = test_store().await;
        let config = sample_config();
        store.create(&config).await.unwrap();

        let mut updated = config.clone();
        updated.title = Some("Hotfix".into());
        updated.enabled = false;
        updated.created_by = "intruder".into();
        store.update(&updated).await.unwrap();

        let got = store.get(&config.id, GUILD).await.unwrap().unwrap();
        assert_eq!(got.title.as_deref(), Some("Hotfix"));
        assert!(!got.enabled);
        // attribution is never updated
        assert_eq!(got.created_by, "tester");
    }

    #[tokio::test]
    async fn test_update_does_not_touch_primary_message_id() {
        let store = test_store().await;
        let config = sample_config();
        store.create(&config).await.unwrap();
        store
            .set_primary_message_id(&config.id, Some("300000000000000001"))
            .await
            .unwrap();

        let mut updated = config.clone();
        updated.title = Some("Edited".into());
        store.update(&updated).await.unwrap();

        let got = store.get(&config.id, GUILD).await.unwrap().unwrap();
        assert_eq!(got.message_id.as_deref(), Some("300000000000000001"));
    }

    #[tokio::test]
    async fn test_list_by_guild_orders_by_updated_at() {
        let store = test_store().await;
        let mut older = sample_config();
        older.updated_at = 100;
        let mut newer = sample_config();
        newer.updated_at = 200;
        store.create(&older).await.unwrap();
        store.create(&newer).await.unwrap();

        let all = store.list_by_guild(GUILD).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);

        assert!(
            store
                .list_by_guild("100000000000000002")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_replace_targets_swaps_whole_set() {
        let store = test_store().await;
        let config = sample_config();
        store.create(&config).await.unwrap();

        store
            .replace_targets(
                &config.id,
                &[
                    target(&config.id, CH1, Some("300000000000000001")),
                    target(&config.id, CH2, None),
                ],
            )
            .await
            .unwrap();
        assert_eq!(store.targets(&config.id).await.unwrap().len(), 2);

        store
            .replace_targets(&config.id, &[target(&config.id, CH2, Some("300000000000000002"))])
            .await
            .unwrap();
        let targets = store.targets(&config.id).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].channel_id, CH2);
        assert_eq!(targets[0].message_id.as_deref(), Some("300000000000000002"));
    }

    #[tokio::test]
    async fn test_replace_targets_failure_leaves_prior_set() {
        let store = test_store().await;
        let config = sample_config();
        store.create(&config).await.unwrap();
        store
            .replace_targets(&config.id, &[target(&config.id, CH1, Some("300000000000000001"))])
            .await
            .unwrap();

        // Duplicate channel rows violate the primary key; the whole
        // replacement must roll back.
        let result = store
            .replace_targets(
                &config.id,
                &[target(&config.id, CH2, None), target(&config.id, CH2, None)],
            )
            .await;
        assert!(result.is_err());

        let targets = store.targets(&config.id).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].channel_id, CH1);
        assert_eq!(targets[0].message_id.as_deref(), Some("300000000000000001"));
    }

    #[tokio::test]
    async fn test_delete_removes_config_and_targets() {
        let store = test_store().await;
        let config = sample_config();
        store.create(&config).await.unwrap();
        store
            .replace_targets(
                &config.id,
                &[target(&config.id, CH1, None), target(&config.id, CH2, None)],
            )
            .await
            .unwrap();

        store.delete(&config.id, GUILD).await.unwrap();

        assert!(store.get(&config.id, GUILD).await.unwrap().is_none());
        assert!(store.targets(&config.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_primary_message_id() {
        let store = test_store().await;
        let config = sample_config();
        store.create(&config).await.unwrap();

        store
            .set_primary_message_id(&config.id, Some("300000000000000009"))
            .await
            .unwrap();
        let got = store.get(&config.id, GUILD).await.unwrap().unwrap();
        assert_eq!(got.message_id.as_deref(), Some("300000000000000009"));

        store.set_primary_message_id(&config.id, None).await.unwrap();
        let got = store.get(&config.id, GUILD).await.unwrap().unwrap();
        assert!(got.message_id.is_none());
    }

    #[tokio::test]
    async fn test_targets_preserve_insertion_order() {
        let store = test_store().await;
        let config = sample_config();
        store.create(&config).await.unwrap();

        store
            .replace_targets(
                &config.id,
                &[target(&config.id, CH2, None), target(&config.id, CH1, None)],
            )
            .await
            .unwrap();

        let targets = store.targets(&config.id).await.unwrap();
        assert_eq!(targets[0].channel_id, CH2);
        assert_eq!(targets[1].channel_id, CH1);
    }
}
