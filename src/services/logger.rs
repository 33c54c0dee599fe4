use crate::services::settings::GuildSettings;
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Discord blurple, the fixed accent for every log embed.
const ACCENT_COLOR: u32 = 0x5865F2;

/// Delivers formatted log embeds to a guild's configured log channel.
///
/// Delivery is best-effort, at-most-once: an unresolved channel is a silent
/// no-op (the guild opted out or is misconfigured) and a failed send is
/// logged locally and dropped.
pub struct LogDispatcher {
    default_channel_id: Option<serenity::ChannelId>,
}

impl LogDispatcher {
    pub fn new(default_channel_id: Option<serenity::ChannelId>) -> Self {
        Self { default_channel_id }
    }

    /// Channel precedence: a configured settings value always wins, even
    /// when malformed (a broken id resolves to nothing rather than leaking
    /// logs into the process-wide default); only an absent value falls back.
    pub(crate) fn pick_channel(
        settings: &GuildSettings,
        default: Option<serenity::ChannelId>,
    ) -> Option<serenity::ChannelId> {
        match settings.log_channel_id() {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|id| *id != 0)
                .map(serenity::ChannelId::new),
            None => default,
        }
    }

    /// Resolve and validate the destination channel. Returns `None` when no
    /// channel is configured, the fetch fails, or the channel belongs to a
    /// different guild.
    pub async fn resolve_channel(
        &self,
        http: &serenity::Http,
        guild_id: serenity::GuildId,
        settings: &GuildSettings,
    ) -> Option<serenity::ChannelId> {
        let channel_id = Self::pick_channel(settings, self.default_channel_id)?;

        match http.get_channel(channel_id).await {
            Ok(channel) => match channel.guild() {
                Some(guild_channel) if guild_channel.guild_id == guild_id => Some(channel_id),
                _ => {
                    warn!(
                        guild = guild_id.get(),
                        channel = channel_id.get(),
                        "log channel is not a channel of this guild"
                    );
                    None
                }
            },
            Err(e) => {
                warn!(
                    guild = guild_id.get(),
                    channel = channel_id.get(),
                    "log channel fetch failed: {e:?}"
                );
                None
            }
        }
    }

    /// Send one log embed. Never returns an error; failures are visible to
    /// the operator through tracing only.
    pub async fn send(
        &self,
        http: &serenity::Http,
        guild_id: serenity::GuildId,
        settings: &GuildSettings,
        title: &str,
        description: &str,
    ) {
        let Some(channel_id) = self.resolve_channel(http, guild_id, settings).await else {
            return;
        };

        let embed = serenity::CreateEmbed::new()
            .title(title)
            .description(description)
            .colour(ACCENT_COLOR)
            .timestamp(serenity::Timestamp::now());

        if let Err(e) = channel_id
            .send_message(http, serenity::CreateMessage::new().embed(embed))
            .await
        {
            warn!(
                guild = guild_id.get(),
                channel = channel_id.get(),
                "log delivery failed: {e:?}"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: serde_json::Value) -> GuildSettings {
        GuildSettings::from_value(value)
    }

    const DEFAULT: Option<serenity::ChannelId> = Some(serenity::ChannelId::new(555));

    #[test]
    fn test_settings_channel_wins_over_default() {
        let s = settings(json!({ "log_channel_id": "123" }));
        assert_eq!(
            LogDispatcher::pick_channel(&s, DEFAULT),
            Some(serenity::ChannelId::new(123))
        );
    }

    #[test]
    fn test_absent_settings_channel_falls_back_to_default() {
        assert_eq!(
            LogDispatcher::pick_channel(&settings(json!({})), DEFAULT),
            DEFAULT
        );
        assert_eq!(
            LogDispatcher::pick_channel(&settings(json!({ "log_channel_id": "  " })), DEFAULT),
            DEFAULT
        );
    }

    #[test]
    fn test_malformed_settings_channel_does_not_fall_back() {
        let s = settings(json!({ "log_channel_id": "not-a-snowflake" }));
        assert_eq!(LogDispatcher::pick_channel(&s, DEFAULT), None);
    }

    #[test]
    fn test_nothing_configured_resolves_to_nothing() {
        assert_eq!(LogDispatcher::pick_channel(&settings(json!({})), None), None);
    }
}
