use crate::services::settings::LogCategory;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;

const DELETE_CONTENT_LIMIT: usize = 1500;
const EDIT_CONTENT_LIMIT: usize = 900;

pub fn handler<'a>(
    ctx: &'a serenity::Context,
    event: &'a serenity::FullEvent,
    data: &'a Data,
) -> poise::BoxFuture<'a, Result<(), Error>> {
    Box::pin(handle_event(ctx, event, data))
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            guild_id,
            ..
        } => handle_message_delete(ctx, *guild_id, *channel_id, *deleted_message_id, data).await,
        serenity::FullEvent::MessageUpdate {
            old_if_available,
            new,
            event,
            ..
        } => {
            handle_message_edit(ctx, old_if_available.as_ref(), new.as_ref(), event, data).await
        }
        _ => Ok(()),
    }
}

async fn handle_message_delete(
    ctx: &serenity::Context,
    guild_id: Option<serenity::GuildId>,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = guild_id else {
        return Ok(());
    };

    // Extract what the cache still has before any await; the cache ref
    // must not be held across a suspension point.
    let cached = ctx
        .cache
        .message(channel_id, message_id)
        .map(|message| (message.author.clone(), message.content.clone()));

    // Bot-authored message noise is excluded from logging.
    if cached.as_ref().is_some_and(|(author, _)| author.bot) {
        return Ok(());
    }

    let settings = data.settings.get(guild_id).await;
    if !settings.is_enabled(LogCategory::MessageDelete) {
        return Ok(());
    }

    let author_line = match &cached {
        Some((author, _)) => format!("{} (`{}`)", author.tag(), author.id),
        None => "Unknown".to_string(),
    };
    let content = display_content(cached.as_ref().map(|(_, c)| c.as_str()), DELETE_CONTENT_LIMIT);

    let description = format!(
        "**Author:** {}\n**Channel:** <#{}>\n**Content:**\n{}",
        author_line, channel_id, content
    );

    data.logger
        .send(&ctx.http, guild_id, &settings, "🗑️ Message Deleted", &description)
        .await;

    Ok(())
}

async fn handle_message_edit(
    ctx: &serenity::Context,
    old: Option<&serenity::Message>,
    new: Option<&serenity::Message>,
    event: &serenity::MessageUpdateEvent,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = event.guild_id else {
        return Ok(());
    };

    let author = new
        .map(|message| &message.author)
        .or(event.author.as_ref())
        .or(old.map(|message| &message.author));
    if author.is_some_and(|author| author.bot) {
        return Ok(());
    }

    let old_content = old.map(|message| message.content.as_str());
    let new_content = new
        .map(|message| message.content.as_str())
        .or(event.content.as_deref());

    // Embed unfurls and pin updates arrive as edits too; only a content
    // change is worth a log entry. With one side unknown, log anyway.
    if let (Some(old_content), Some(new_content)) = (old_content, new_content) {
        if old_content == new_content {
            return Ok(());
        }
    }

    let settings = data.settings.get(guild_id).await;
    if !settings.is_enabled(LogCategory::MessageEdit) {
        return Ok(());
    }

    let author_line = match author {
        Some(author) => format!("{} (`{}`)", author.tag(), author.id),
        None => "Unknown".to_string(),
    };

    let description = format!(
        "**Author:** {}\n**Channel:** <#{}>\n\n**Before:**\n{}\n\n**After:**\n{}",
        author_line,
        event.channel_id,
        display_content(old_content, EDIT_CONTENT_LIMIT),
        display_content(new_content, EDIT_CONTENT_LIMIT)
    );

    data.logger
        .send(&ctx.http, guild_id, &settings, "✏️ Message Edited", &description)
        .await;

    Ok(())
}

/// Render message content for an embed body: empty or unknown content
/// becomes a placeholder, long content is clipped on a char boundary.
fn display_content(content: Option<&str>, limit: usize) -> String {
    let content = content.unwrap_or("");
    if content.is_empty() {
        return "*no text*".to_string();
    }
    content.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_content_placeholder_for_missing_or_empty() {
        assert_eq!(display_content(None, 10), "*no text*");
        assert_eq!(display_content(Some(""), 10), "*no text*");
    }

    #[test]
    fn test_display_content_clips_to_limit() {
        let long = "x".repeat(2000);
        assert_eq!(display_content(Some(&long), 1500).chars().count(), 1500);
        assert_eq!(display_content(Some("short"), 1500), "short");
    }
}
