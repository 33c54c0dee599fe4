use crate::services::audit::{self, AuditAttribution, ModAction};
use crate::services::settings::LogCategory;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

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
        serenity::FullEvent::GuildMemberAddition { new_member, .. } => {
            handle_member_join(ctx, new_member, data).await
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            handle_member_remove(ctx, *guild_id, user, data).await
        }
        serenity::FullEvent::GuildBanAddition {
            guild_id,
            banned_user,
            ..
        } => handle_ban(ctx, *guild_id, banned_user, data).await,
        _ => Ok(()),
    }
}

async fn handle_member_join(
    ctx: &serenity::Context,
    member: &serenity::Member,
    data: &Data,
) -> Result<(), Error> {
    let guild_id = member.guild_id;
    let settings = data.settings.get(guild_id).await;
    if !settings.is_enabled(LogCategory::Join) {
        return Ok(());
    }

    info!(guild = guild_id.get(), user = member.user.id.get(), "member joined");

    // Joins can be logged without invite info; the sub-toggle only gates
    // the attribution lookup.
    let invite_info = if settings.is_enabled(LogCategory::Invites) {
        data.invites
            .attribute_join(&ctx.http, guild_id)
            .await
            .to_string()
    } else {
        String::new()
    };

    let created_at = format!("<t:{}:F>", member.user.created_at().unix_timestamp());
    let description = format!(
        "**User:** {} (`{}`)\n**Account created:** {}\n\n{}",
        member.user.tag(),
        member.user.id,
        created_at,
        invite_info
    );

    data.logger
        .send(&ctx.http, guild_id, &settings, "✅ Member Joined", &description)
        .await;

    Ok(())
}

/// A removal is a kick when a matching audit entry is fresh enough;
/// otherwise it logs as a plain leave (gated under the join category, the
/// way the dashboard groups membership traffic).
async fn handle_member_remove(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    data: &Data,
) -> Result<(), Error> {
    let settings = data.settings.get(guild_id).await;

    if settings.is_enabled(LogCategory::Kick) {
        if let Some(entry) = audit::find_actor(&ctx.http, guild_id, ModAction::Kick, user.id).await
        {
            let description = format!(
                "**User:** {} (`{}`)\n**By:** {}\n**Reason:** {}",
                user.tag(),
                user.id,
                entry.actor_line(),
                entry.reason
            );
            data.logger
                .send(&ctx.http, guild_id, &settings, "👢 Member Kicked", &description)
                .await;
            return Ok(());
        }
    }

    if !settings.is_enabled(LogCategory::Join) {
        return Ok(());
    }

    let description = format!("**User:** {} (`{}`)", user.tag(), user.id);
    data.logger
        .send(&ctx.http, guild_id, &settings, "❌ Member Left", &description)
        .await;

    Ok(())
}

async fn handle_ban(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    data: &Data,
) -> Result<(), Error> {
    let settings = data.settings.get(guild_id).await;
    if !settings.is_enabled(LogCategory::Ban) {
        return Ok(());
    }

    let entry = audit::find_actor(&ctx.http, guild_id, ModAction::Ban, user.id)
        .await
        .unwrap_or_else(AuditAttribution::unknown);

    let description = format!(
        "**User:** {} (`{}`)\n**By:** {}\n**Reason:** {}",
        user.tag(),
        user.id,
        entry.actor_line(),
        entry.reason
    );

    data.logger
        .send(&ctx.http, guild_id, &settings, "⛔ Member Banned", &description)
        .await;

    Ok(())
}
