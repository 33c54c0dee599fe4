use crate::modules::EventHandlerFn;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use std::sync::OnceLock;
use tracing::{error, info};

fn module_handlers() -> &'static [EventHandlerFn] {
    static HANDLERS: OnceLock<Vec<EventHandlerFn>> = OnceLock::new();
    HANDLERS.get_or_init(crate::modules::event_handlers)
}

/// Entry point for every gateway event: core lifecycle handling first, then
/// dispatch to the module handlers. A failing handler is logged and never
/// blocks the others.
pub async fn dispatch(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot, .. } => {
            info!(
                "Logged in as {} (id: {})",
                data_about_bot.user.name, data_about_bot.user.id
            );
        }
        serenity::FullEvent::CacheReady { guilds, .. } => {
            // Seed the invite snapshots so the first join in each guild has
            // a baseline to diff against.
            for guild_id in guilds {
                data.invites.refresh(&ctx.http, *guild_id).await;
            }
        }
        serenity::FullEvent::GuildCreate { guild, is_new, .. } => {
            if is_new.unwrap_or(false) {
                info!("Joined new guild: {} ({})", guild.name, guild.id);
            }
            data.invites.refresh(&ctx.http, guild.id).await;
            // Touching the settings ensures the guild's row exists with the
            // column defaults before the dashboard first sees it.
            let _ = data.settings.get(guild.id).await;
        }
        serenity::FullEvent::GuildDelete { incomplete, .. } => {
            info!("Left guild: {}", incomplete.id);
            data.invites.forget(incomplete.id);
        }
        _ => {}
    }

    for handler in module_handlers() {
        if let Err(e) = handler(ctx, event, data).await {
            error!("Error in event handler: {:?}", e);
        }
    }

    Ok(())
}
