use chrono::Utc;
use serenity::http::Http;
use serenity::model::guild::audit_log::{Action, MemberAction};
use serenity::model::id::{GuildId, UserId};
use tracing::debug;

/// Entries fetched per lookup. Audit writes land close to the gateway
/// event, so a short page is enough.
const AUDIT_FETCH_LIMIT: u8 = 10;

/// Moderation actions the pipeline attributes to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModAction {
    Kick,
    Ban,
    MemberUpdate,
    RoleUpdate,
}

impl ModAction {
    fn audit_action(self) -> Action {
        match self {
            ModAction::Kick => Action::Member(MemberAction::Kick),
            ModAction::Ban => Action::Member(MemberAction::BanAdd),
            ModAction::MemberUpdate => Action::Member(MemberAction::Update),
            ModAction::RoleUpdate => Action::Member(MemberAction::RoleUpdate),
        }
    }

    /// Matching window between the audit entry and the gateway event.
    /// Kick removals arrive faster than the other member events.
    pub fn window_secs(self) -> i64 {
        match self {
            ModAction::Kick => 20,
            _ => 25,
        }
    }
}

/// Who performed a moderation action, as recovered from the audit log.
#[derive(Debug, Clone)]
pub struct AuditAttribution {
    pub actor_tag: String,
    pub actor_id: Option<UserId>,
    pub reason: String,
    pub age_seconds: i64,
}

impl AuditAttribution {
    pub fn unknown() -> Self {
        Self {
            actor_tag: "Unknown".to_string(),
            actor_id: None,
            reason: "No reason".to_string(),
            age_seconds: 0,
        }
    }

    /// `tag (\`id\`)`, or the bare Unknown sentinel.
    pub fn actor_line(&self) -> String {
        match self.actor_id {
            Some(id) => format!("{} (`{}`)", self.actor_tag, id),
            None => self.actor_tag.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuditCandidate {
    pub target_id: Option<u64>,
    pub executor_id: u64,
    pub reason: Option<String>,
    pub created_at: i64,
}

/// First entry (in fetch order, newest first) whose target matches, and
/// only then the age check. A stale first match ends the search: no
/// fallback to older entries for the same target.
pub(crate) fn correlate<'a>(
    entries: &'a [AuditCandidate],
    target_id: u64,
    window_secs: i64,
    now: i64,
) -> Option<&'a AuditCandidate> {
    let candidate = entries
        .iter()
        .find(|entry| entry.target_id == Some(target_id))?;
    (now - candidate.created_at <= window_secs).then_some(candidate)
}

/// Attribute a moderation action on `target` to its audit-log actor.
/// Returns `None` when no entry matches within the action's window, or on
/// any fetch error (missing permission, rate limit) — callers degrade to
/// the Unknown sentinels.
pub async fn find_actor(
    http: &Http,
    guild_id: GuildId,
    action: ModAction,
    target: UserId,
) -> Option<AuditAttribution> {
    let logs = match guild_id
        .audit_logs(
            http,
            Some(action.audit_action()),
            None,
            None,
            Some(AUDIT_FETCH_LIMIT),
        )
        .await
    {
        Ok(logs) => logs,
        Err(e) => {
            debug!(guild = guild_id.get(), "audit log fetch failed: {e:?}");
            return None;
        }
    };

    let candidates: Vec<AuditCandidate> = logs
        .entries
        .iter()
        .map(|entry| AuditCandidate {
            target_id: entry.target_id.map(|id| id.get()),
            executor_id: entry.user_id.get(),
            reason: entry.reason.clone(),
            created_at: entry.id.created_at().unix_timestamp(),
        })
        .collect();

    let now = Utc::now().timestamp();
    let hit = correlate(&candidates, target.get(), action.window_secs(), now)?;

    let actor_id = UserId::new(hit.executor_id);
    let actor_tag = match logs.users.iter().find(|user| user.1.id == actor_id) {
        Some(user) => user.1.tag(),
        None => match http.get_user(actor_id).await {
            Ok(user) => user.tag(),
            Err(_) => actor_id.to_string(),
        },
    };

    Some(AuditAttribution {
        actor_tag,
        actor_id: Some(actor_id),
        reason: hit
            .reason
            .clone()
            .unwrap_or_else(|| "No reason".to_string()),
        age_seconds: now - hit.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(target: u64, executor: u64, age_secs: i64, now: i64) -> AuditCandidate {
        AuditCandidate {
            target_id: Some(target),
            executor_id: executor,
            reason: None,
            created_at: now - age_secs,
        }
    }

    #[test]
    fn test_stale_first_match_short_circuits() {
        let now = 1_000_000;
        // Newest-first fetch order: the first target match is 30s old and a
        // fresher match sits behind it. Policy: no further search.
        let entries = vec![candidate(5, 10, 30, now), candidate(5, 11, 10, now)];
        assert!(correlate(&entries, 5, 25, now).is_none());
    }

    #[test]
    fn test_non_matching_targets_are_skipped() {
        let now = 1_000_000;
        let entries = vec![candidate(9, 10, 5, now), candidate(5, 11, 10, now)];
        let hit = correlate(&entries, 5, 25, now).unwrap();
        assert_eq!(hit.executor_id, 11);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = 1_000_000;
        let entries = vec![candidate(5, 10, 25, now)];
        assert!(correlate(&entries, 5, 25, now).is_some());
        let entries = vec![candidate(5, 10, 26, now)];
        assert!(correlate(&entries, 5, 25, now).is_none());
    }

    #[test]
    fn test_no_entries_no_actor() {
        assert!(correlate(&[], 5, 25, 1_000_000).is_none());
    }

    #[test]
    fn test_windows_per_action() {
        assert_eq!(ModAction::Kick.window_secs(), 20);
        assert_eq!(ModAction::Ban.window_secs(), 25);
        assert_eq!(ModAction::MemberUpdate.window_secs(), 25);
        assert_eq!(ModAction::RoleUpdate.window_secs(), 25);
    }

    #[test]
    fn test_unknown_sentinel_lines() {
        let unknown = AuditAttribution::unknown();
        assert_eq!(unknown.actor_line(), "Unknown");
        assert_eq!(unknown.reason, "No reason");
    }
}
