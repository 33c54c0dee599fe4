use dashmap::DashMap;
use serenity::http::Http;
use serenity::model::id::{GuildId, UserId};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// One invite as fetched from Discord, reduced to what attribution needs.
#[derive(Debug, Clone)]
pub struct InviteRecord {
    pub code: String,
    pub uses: u64,
    pub inviter_id: Option<UserId>,
    pub inviter_tag: Option<String>,
}

/// Outcome of a join attribution, rendered into the log body via `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinAttribution {
    Invite {
        code: String,
        uses: u64,
        inviter: Option<(String, u64)>,
    },
    Vanity {
        code: String,
    },
    Unknown,
    Unreadable,
}

impl fmt::Display for JoinAttribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinAttribution::Invite {
                code,
                uses,
                inviter,
            } => {
                let inviter = match inviter {
                    Some((tag, id)) => format!("{tag} (`{id}`)"),
                    None => "Unknown inviter".to_string(),
                };
                write!(
                    f,
                    "**Invite:** `{code}`\n**Inviter:** {inviter}\n**Uses:** {uses}"
                )
            }
            JoinAttribution::Vanity { code } => write!(f, "**Vanity:** `{code}`"),
            JoinAttribution::Unknown => write!(f, "**Invite:** Unknown"),
            JoinAttribution::Unreadable => {
                write!(f, "**Invite:** Unknown (error reading invites)")
            }
        }
    }
}

/// Keyed store of per-guild invite snapshots (code -> cumulative uses).
///
/// Each guild owns a single slot; refreshes are last-write-wins and a
/// snapshot is only ever replaced whole. Concurrent joins in one guild can
/// race on the slot — the diff is a best-effort heuristic, not a source of
/// truth.
pub struct InviteTracker {
    cache: DashMap<GuildId, HashMap<String, u64>>,
}

impl InviteTracker {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Replace the guild's snapshot with the current invite list. A failed
    /// fetch resets the snapshot to empty so the next join cannot diff
    /// against stale counts.
    pub async fn refresh(&self, http: &Http, guild_id: GuildId) {
        match fetch_invites(http, guild_id).await {
            Ok(records) => {
                self.cache.insert(guild_id, snapshot_of(&records));
                info!(guild = guild_id.get(), "invite snapshot refreshed");
            }
            Err(e) => {
                debug!(guild = guild_id.get(), "invite fetch failed: {e:?}");
                self.cache.insert(guild_id, HashMap::new());
            }
        }
    }

    /// Drop a guild's snapshot when the bot leaves it.
    pub fn forget(&self, guild_id: GuildId) {
        self.cache.remove(&guild_id);
    }

    /// Work out which invite a fresh join consumed. Never fails: an
    /// unreadable invite list degrades to an explicit Unknown outcome and
    /// leaves the snapshot untouched.
    pub async fn attribute_join(
        &self,
        http: &Http,
        guild_id: GuildId,
    ) -> JoinAttribution {
        let current = match fetch_invites(http, guild_id).await {
            Ok(records) => records,
            Err(e) => {
                debug!(guild = guild_id.get(), "invite fetch failed: {e:?}");
                return JoinAttribution::Unreadable;
            }
        };

        if let Some(attribution) = self.attribute_with(guild_id, current) {
            return attribution;
        }

        // No counted invite moved; a vanity URL has no per-use counter, so
        // its presence is the best remaining guess.
        match guild_id.to_partial_guild(http).await {
            Ok(guild) => match guild.vanity_url_code {
                Some(code) => JoinAttribution::Vanity { code },
                None => JoinAttribution::Unknown,
            },
            Err(_) => JoinAttribution::Unknown,
        }
    }

    /// Diff the cached snapshot against a freshly fetched invite list and
    /// install the new snapshot regardless of the outcome.
    pub(crate) fn attribute_with(
        &self,
        guild_id: GuildId,
        current: Vec<InviteRecord>,
    ) -> Option<JoinAttribution> {
        let before = self
            .cache
            .get(&guild_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        let used = find_consumed(&before, &current).cloned();
        self.cache.insert(guild_id, snapshot_of(&current));

        used.map(|record| JoinAttribution::Invite {
            code: record.code,
            uses: record.uses,
            inviter: match (record.inviter_tag, record.inviter_id) {
                (Some(tag), Some(id)) => Some((tag, id.get())),
                _ => None,
            },
        })
    }

    #[cfg(test)]
    pub(crate) fn install_snapshot(
        &self,
        guild_id: GuildId,
        snapshot: HashMap<String, u64>,
    ) {
        self.cache.insert(guild_id, snapshot);
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self, guild_id: GuildId) -> Option<HashMap<String, u64>> {
        self.cache.get(&guild_id).map(|entry| entry.value().clone())
    }
}

pub(crate) fn snapshot_of(records: &[InviteRecord]) -> HashMap<String, u64> {
    records
        .iter()
        .map(|record| (record.code.clone(), record.uses))
        .collect()
}

/// First invite (in fetched order) whose use count increased over the
/// cached baseline. A code absent from the snapshot counts from zero, so a
/// join through a freshly created invite is still detected.
pub(crate) fn find_consumed<'a>(
    before: &HashMap<String, u64>,
    current: &'a [InviteRecord],
) -> Option<&'a InviteRecord> {
    current
        .iter()
        .find(|record| record.uses > before.get(&record.code).copied().unwrap_or(0))
}

async fn fetch_invites(
    http: &Http,
    guild_id: GuildId,
) -> Result<Vec<InviteRecord>, serenity::Error> {
    let invites = guild_id.invites(http).await?;
    Ok(invites
        .into_iter()
        .map(|invite| InviteRecord {
            code: invite.code,
            uses: invite.uses,
            inviter_id: invite.inviter.as_ref().map(|user| user.id),
            inviter_tag: invite.inviter.map(|user| user.tag()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, uses: u64) -> InviteRecord {
        InviteRecord {
            code: code.to_string(),
            uses,
            inviter_id: Some(UserId::new(42)),
            inviter_tag: Some("Tester#0001".to_string()),
        }
    }

    fn snapshot(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
        pairs
            .iter()
            .map(|(code, uses)| (code.to_string(), *uses))
            .collect()
    }

    #[test]
    fn test_diff_picks_the_increased_code() {
        let before = snapshot(&[("A", 5), ("B", 2)]);
        let current = vec![record("A", 5), record("B", 3), record("C", 1)];
        let used = find_consumed(&before, &current).unwrap();
        assert_eq!(used.code, "B");
    }

    #[test]
    fn test_new_code_counts_from_zero_baseline() {
        let before = snapshot(&[("A", 5)]);
        let current = vec![record("A", 5), record("C", 1)];
        let used = find_consumed(&before, &current).unwrap();
        assert_eq!(used.code, "C");
    }

    #[test]
    fn test_no_increase_yields_nothing() {
        let before = snapshot(&[("A", 5), ("B", 2)]);
        let current = vec![record("A", 5), record("B", 2)];
        assert!(find_consumed(&before, &current).is_none());
    }

    #[test]
    fn test_attribution_renders_invite_details() {
        let text = JoinAttribution::Invite {
            code: "ABC".to_string(),
            uses: 4,
            inviter: Some(("Tester#0001".to_string(), 42)),
        }
        .to_string();
        assert!(text.contains("`ABC`"));
        assert!(text.contains("Tester#0001 (`42`)"));
        assert!(text.contains("**Uses:** 4"));

        assert_eq!(
            JoinAttribution::Unknown.to_string(),
            "**Invite:** Unknown"
        );
        assert_eq!(
            JoinAttribution::Unreadable.to_string(),
            "**Invite:** Unknown (error reading invites)"
        );
        assert_eq!(
            JoinAttribution::Vanity {
                code: "cool".to_string()
            }
            .to_string(),
            "**Vanity:** `cool`"
        );
    }

    #[test]
    fn test_attribute_with_diffs_and_advances_snapshot() {
        let tracker = InviteTracker::new();
        let guild = GuildId::new(7);
        tracker.install_snapshot(guild, snapshot(&[("ABC", 3)]));

        let attribution = tracker
            .attribute_with(guild, vec![record("ABC", 4)])
            .unwrap();
        let text = attribution.to_string();
        assert!(text.contains("`ABC`"));
        assert!(text.contains("Tester#0001"));

        assert_eq!(tracker.snapshot(guild), Some(snapshot(&[("ABC", 4)])));
    }

    #[test]
    fn test_attribute_with_installs_snapshot_even_without_match() {
        let tracker = InviteTracker::new();
        let guild = GuildId::new(7);
        tracker.install_snapshot(guild, snapshot(&[("ABC", 3)]));

        assert!(tracker
            .attribute_with(guild, vec![record("ABC", 3), record("XYZ", 0)])
            .is_none());
        assert_eq!(
            tracker.snapshot(guild),
            Some(snapshot(&[("ABC", 3), ("XYZ", 0)]))
        );
    }

    #[test]
    fn test_forget_drops_the_guild_slot() {
        let tracker = InviteTracker::new();
        let guild = GuildId::new(7);
        tracker.install_snapshot(guild, snapshot(&[("ABC", 3)]));
        tracker.forget(guild);
        assert_eq!(tracker.snapshot(guild), None);
    }
}
