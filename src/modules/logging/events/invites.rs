use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Keeps the invite snapshots fresh independent of member joins, so a join
/// diffs against counts observed at the last invite change rather than at
/// startup.
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
        serenity::FullEvent::InviteCreate { data: invite, .. } => {
            let Some(guild_id) = invite.guild_id else {
                warn!("invite {} created without guild_id", invite.code);
                return Ok(());
            };
            data.invites.refresh(&ctx.http, guild_id).await;
        }
        serenity::FullEvent::InviteDelete { data: invite, .. } => {
            let Some(guild_id) = invite.guild_id else {
                warn!("invite {} deleted without guild_id", invite.code);
                return Ok(());
            };
            data.invites.refresh(&ctx.http, guild_id).await;
        }
        _ => {}
    }

    Ok(())
}
