use crate::services::audit::{self, AuditAttribution, ModAction};
use crate::services::settings::LogCategory;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;

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
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            event,
            ..
        } => handle_member_update(ctx, old_if_available.as_ref(), event, data).await,
        _ => Ok(()),
    }
}

/// Role, nickname, and timeout changes all arrive as one member-update
/// event; each is gated and logged independently. The before-state comes
/// from the gateway cache — without it there is nothing to diff against
/// and the update is skipped.
async fn handle_member_update(
    ctx: &serenity::Context,
    before: Option<&serenity::Member>,
    event: &serenity::GuildMemberUpdateEvent,
    data: &Data,
) -> Result<(), Error> {
    let Some(before) = before else {
        return Ok(());
    };
    let guild_id = event.guild_id;
    let settings = data.settings.get(guild_id).await;

    if settings.is_enabled(LogCategory::Roles) {
        let everyone = serenity::RoleId::new(guild_id.get());
        let (added, removed) = diff_roles(&before.roles, &event.roles, everyone);

        if !added.is_empty() || !removed.is_empty() {
            let entry = audit::find_actor(&ctx.http, guild_id, ModAction::RoleUpdate, event.user.id)
                .await
                .unwrap_or_else(AuditAttribution::unknown);

            let description = format!(
                "**User:** {} (`{}`)\n**By:** {}\n**Added:** {}\n**Removed:** {}",
                event.user.tag(),
                event.user.id,
                entry.actor_line(),
                mention_list(&added),
                mention_list(&removed)
            );

            data.logger
                .send(&ctx.http, guild_id, &settings, "🎭 Roles Updated", &description)
                .await;
        }
    }

    if settings.is_enabled(LogCategory::Nickname) && before.nick != event.nick {
        let entry = audit::find_actor(&ctx.http, guild_id, ModAction::MemberUpdate, event.user.id)
            .await
            .unwrap_or_else(AuditAttribution::unknown);

        let old_nick = before.nick.clone().unwrap_or_else(|| before.user.name.clone());
        let new_nick = event.nick.clone().unwrap_or_else(|| event.user.name.clone());

        let description = format!(
            "**User:** {} (`{}`)\n**By:** {}\n**Before:** {}\n**After:** {}",
            event.user.tag(),
            event.user.id,
            entry.actor_line(),
            old_nick,
            new_nick
        );

        data.logger
            .send(&ctx.http, guild_id, &settings, "📝 Nickname Changed", &description)
            .await;
    }

    if settings.is_enabled(LogCategory::Timeout)
        && before.communication_disabled_until != event.communication_disabled_until
    {
        let entry = audit::find_actor(&ctx.http, guild_id, ModAction::MemberUpdate, event.user.id)
            .await
            .unwrap_or_else(AuditAttribution::unknown);

        match event.communication_disabled_until {
            Some(until) => {
                let description = format!(
                    "**User:** {} (`{}`)\n**By:** {}\n**Until:** <t:{}:F>",
                    event.user.tag(),
                    event.user.id,
                    entry.actor_line(),
                    until.unix_timestamp()
                );
                data.logger
                    .send(
                        &ctx.http,
                        guild_id,
                        &settings,
                        "⏳ Timeout Applied/Updated",
                        &description,
                    )
                    .await;
            }
            None => {
                let description = format!(
                    "**User:** {} (`{}`)\n**By:** {}",
                    event.user.tag(),
                    event.user.id,
                    entry.actor_line()
                );
                data.logger
                    .send(&ctx.http, guild_id, &settings, "✅ Timeout Removed", &description)
                    .await;
            }
        }
    }

    Ok(())
}

/// Diff two role-id sets, dropping the implicit @everyone role (its id is
/// the guild id) from both sides.
pub(crate) fn diff_roles(
    before: &[serenity::RoleId],
    after: &[serenity::RoleId],
    everyone: serenity::RoleId,
) -> (Vec<serenity::RoleId>, Vec<serenity::RoleId>) {
    let added = after
        .iter()
        .filter(|id| **id != everyone && !before.contains(id))
        .copied()
        .collect();
    let removed = before
        .iter()
        .filter(|id| **id != everyone && !after.contains(id))
        .copied()
        .collect();
    (added, removed)
}

fn mention_list(roles: &[serenity::RoleId]) -> String {
    if roles.is_empty() {
        return "None".to_string();
    }
    roles
        .iter()
        .map(|id| format!("<@&{}>", id.get()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<serenity::RoleId> {
        raw.iter().map(|id| serenity::RoleId::new(*id)).collect()
    }

    #[test]
    fn test_role_diff_excludes_everyone() {
        let everyone = serenity::RoleId::new(999);
        let (added, removed) = diff_roles(&ids(&[999, 1]), &ids(&[999, 1, 2]), everyone);
        assert_eq!(added, ids(&[2]));
        assert!(removed.is_empty());
    }

    #[test]
    fn test_role_diff_everyone_only_is_no_change() {
        let everyone = serenity::RoleId::new(999);
        let (added, removed) = diff_roles(&ids(&[999]), &ids(&[999]), everyone);
        assert!(added.is_empty());
        assert!(removed.is_empty());
    }

    #[test]
    fn test_role_diff_reports_removals() {
        let everyone = serenity::RoleId::new(999);
        let (added, removed) = diff_roles(&ids(&[999, 1, 2]), &ids(&[999, 2]), everyone);
        assert!(added.is_empty());
        assert_eq!(removed, ids(&[1]));
    }

    #[test]
    fn test_mention_list_renders_none_when_empty() {
        assert_eq!(mention_list(&[]), "None");
        assert_eq!(mention_list(&ids(&[1, 2])), "<@&1>, <@&2>");
    }
}
