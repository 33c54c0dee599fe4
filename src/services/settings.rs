use crate::db::entities::guild_settings;
use crate::Error;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde_json::Value;
use serenity::async_trait;
use serenity::model::id::GuildId;
use std::time::Duration;
use tracing::warn;

/// The nine loggable event categories exposed as dashboard toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Join,
    Invites,
    Nickname,
    Roles,
    MessageEdit,
    MessageDelete,
    Ban,
    Kick,
    Timeout,
}

impl LogCategory {
    pub fn key(self) -> &'static str {
        match self {
            LogCategory::Join => "log_join",
            LogCategory::Invites => "log_invites",
            LogCategory::Nickname => "log_nickname",
            LogCategory::Roles => "log_roles",
            LogCategory::MessageEdit => "log_message_edit",
            LogCategory::MessageDelete => "log_message_delete",
            LogCategory::Ban => "log_ban",
            LogCategory::Kick => "log_kick",
            LogCategory::Timeout => "log_timeout",
        }
    }

    /// Every category logs unless the dashboard turned it off.
    pub fn default_enabled(self) -> bool {
        true
    }
}

/// Read-only per-invocation snapshot of a guild's settings.
///
/// Both sources produce a JSON object: the HTTP API returns one directly and
/// a database row serializes into one. Toggle values are kept raw because
/// the store may hand back booleans, 0/1 integers, or textual forms, and
/// normalization happens at read time.
#[derive(Debug, Clone, Default)]
pub struct GuildSettings {
    values: serde_json::Map<String, Value>,
}

impl GuildSettings {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    /// The configured log channel id, trimmed; an empty value counts as
    /// unset. Numeric ids (HTTP sources have sent both) are accepted.
    pub fn log_channel_id(&self) -> Option<String> {
        match self.values.get("log_channel_id") {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn is_enabled(&self, category: LogCategory) -> bool {
        normalize_flag(self.values.get(category.key()), category.default_enabled())
    }
}

/// Normalize a stored toggle value to a boolean.
///
/// The store may deliver booleans, 0/1 integers, or textual forms
/// ("1"/"true"/"yes"/"on" and friends). Missing, null, and empty-string
/// values mean "use the category default", never false.
fn normalize_flag(value: Option<&Value>, default: bool) -> bool {
    match value {
        None | Some(Value::Null) => default,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => {
            let s = s.trim().to_lowercase();
            if s.is_empty() {
                return default;
            }
            matches!(s.as_str(), "1" | "true" | "yes" | "on")
        }
        // JS truthiness for anything else, as the dashboard stored it.
        Some(_) => true,
    }
}

/// Where settings snapshots come from.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn fetch(&self, guild_id: GuildId) -> Result<Option<GuildSettings>, Error>;
}

/// Reads the dashboard's database directly. Ensures the guild row exists
/// before reading so a fresh guild gets the column defaults.
pub struct DbSettingsSource {
    db: DatabaseConnection,
}

impl DbSettingsSource {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsSource for DbSettingsSource {
    async fn fetch(&self, guild_id: GuildId) -> Result<Option<GuildSettings>, Error> {
        let id = guild_id.get() as i64;

        if let Some(model) = guild_settings::Entity::find_by_id(id).one(&self.db).await? {
            return Ok(Some(GuildSettings::from_value(serde_json::to_value(
                model,
            )?)));
        }

        let row = guild_settings::ActiveModel {
            guild_id: Set(id),
            ..Default::default()
        };
        guild_settings::Entity::insert(row)
            .on_conflict(
                OnConflict::column(guild_settings::Column::GuildId)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await?;

        let model = guild_settings::Entity::find_by_id(id).one(&self.db).await?;
        match model {
            Some(model) => Ok(Some(GuildSettings::from_value(serde_json::to_value(
                model,
            )?))),
            None => Ok(None),
        }
    }
}

/// Reads settings over the dashboard's HTTP API.
pub struct HttpSettingsSource {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

const HTTP_SETTINGS_TIMEOUT: Duration = Duration::from_secs(10);

impl HttpSettingsSource {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SettingsSource for HttpSettingsSource {
    async fn fetch(&self, guild_id: GuildId) -> Result<Option<GuildSettings>, Error> {
        if self.api_key.is_empty() {
            warn!("BOT_API_KEY is not set; settings API reads are disabled");
            return Ok(None);
        }

        let url = format!(
            "{}/api/settings/{}",
            self.base_url.trim_end_matches('/'),
            guild_id.get()
        );
        let response = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .timeout(HTTP_SETTINGS_TIMEOUT)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Ok(None);
        }

        let value = response.json::<Value>().await?;
        Ok(Some(GuildSettings::from_value(value)))
    }
}

/// Settings capability handed to every event handler. The source is picked
/// once at construction; reads never fail, they degrade to the category
/// defaults so logging does not go dark on a settings-store hiccup.
pub struct SettingsProvider {
    source: Box<dyn SettingsSource>,
}

impl SettingsProvider {
    pub fn database(db: DatabaseConnection) -> Self {
        Self {
            source: Box::new(DbSettingsSource::new(db)),
        }
    }

    pub fn http(base_url: String, api_key: String) -> Self {
        Self {
            source: Box::new(HttpSettingsSource::new(base_url, api_key)),
        }
    }

    #[cfg(test)]
    pub fn from_source(source: Box<dyn SettingsSource>) -> Self {
        Self { source }
    }

    pub async fn get(&self, guild_id: GuildId) -> GuildSettings {
        match self.source.fetch(guild_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => GuildSettings::default(),
            Err(e) => {
                warn!(guild = guild_id.get(), "settings fetch failed: {e:?}");
                GuildSettings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> GuildSettings {
        GuildSettings::from_value(value)
    }

    #[test]
    fn test_true_equivalent_representations() {
        for v in [json!(1), json!("1"), json!("true"), json!("TRUE"), json!(" yes "), json!("on"), json!(true)] {
            let s = settings(json!({ "log_ban": v }));
            assert!(s.is_enabled(LogCategory::Ban), "expected {v:?} to enable");
        }
    }

    #[test]
    fn test_false_equivalent_representations() {
        for v in [json!(0), json!("0"), json!("false"), json!("no"), json!("off"), json!(false), json!(2)] {
            let s = settings(json!({ "log_ban": v }));
            assert!(!s.is_enabled(LogCategory::Ban), "expected {v:?} to disable");
        }
    }

    #[test]
    fn test_missing_null_and_empty_use_category_default() {
        let s = settings(json!({ "log_kick": null, "log_roles": "", "log_timeout": "   " }));
        assert!(s.is_enabled(LogCategory::Kick));
        assert!(s.is_enabled(LogCategory::Roles));
        assert!(s.is_enabled(LogCategory::Timeout));
        assert!(s.is_enabled(LogCategory::Join));
        assert!(GuildSettings::default().is_enabled(LogCategory::MessageDelete));
    }

    #[test]
    fn test_log_channel_id_trimmed_and_empty_is_unset() {
        assert_eq!(
            settings(json!({ "log_channel_id": "  123456789  " })).log_channel_id(),
            Some("123456789".to_string())
        );
        assert_eq!(settings(json!({ "log_channel_id": "" })).log_channel_id(), None);
        assert_eq!(settings(json!({})).log_channel_id(), None);
        assert_eq!(
            settings(json!({ "log_channel_id": 987654321 })).log_channel_id(),
            Some("987654321".to_string())
        );
    }

    struct FailingSource;

    #[async_trait]
    impl SettingsSource for FailingSource {
        async fn fetch(
            &self,
            _guild_id: GuildId,
        ) -> Result<Option<GuildSettings>, Error> {
            Err(anyhow::anyhow!("store unreachable"))
        }
    }

    #[tokio::test]
    async fn test_provider_fails_open_to_defaults() {
        let provider = SettingsProvider::from_source(Box::new(FailingSource));
        let s = provider.get(GuildId::new(1)).await;
        assert!(s.is_enabled(LogCategory::Join));
        assert!(s.is_enabled(LogCategory::MessageEdit));
        assert_eq!(s.log_channel_id(), None);
    }
}
