use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::models::{CapabilitySet, List, Session, ShareLink};
use crate::db::{ListRepository, MembershipRepository, SessionRepository, ShareLinkRepository};
use crate::error::AppResult;
use crate::services::active_list::ActiveListService;

// ============================================================================
// Share Link Manager
// ============================================================================

/// Owner-facing view of an outstanding link: the full bearer URL plus its
/// grants, used to audit what is out there.
#[derive(Debug, Serialize)]
pub struct LinkSummary {
    pub id: String,
    pub url: String,
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_toggle: bool,
    pub expires_at: String,
}

/// Outcome of staging a followed link against a fresh login.
#[derive(Debug, Clone, Serialize)]
pub struct PendingInvite {
    pub list_name: String,
}

pub struct ShareLinkService;

impl ShareLinkService {
    /// Issue a capability-scoped expiring link for a list the caller owns
    /// (ownership is checked at the route layer). The duration amount is
    /// clamped to at least 1 unit; an unrecognized unit falls back to the
    /// configured default lifetime.
    pub async fn issue(
        pool: &SqlitePool,
        config: &Config,
        list_id: &str,
        amount: i64,
        unit: &str,
        caps: CapabilitySet,
    ) -> AppResult<ShareLink> {
        let amount = amount.max(1);
        let lifetime = match unit.trim().to_ascii_lowercase().as_str() {
            "minute" | "minutes" => Duration::minutes(amount),
            "hour" | "hours" => Duration::hours(amount),
            "day" | "days" => Duration::days(amount),
            _ => Duration::hours(config.app.default_link_hours),
        };

        let expires_at = Utc::now().naive_utc() + lifetime;
        ShareLinkRepository::create(pool, list_id, expires_at, caps).await
    }

    /// Resolve a bearer token to its link and list. Missing and expired
    /// tokens are indistinguishable: both yield `None`.
    pub async fn resolve(
        pool: &SqlitePool,
        token: &str,
    ) -> AppResult<Option<(ShareLink, List)>> {
        let link = match ShareLinkRepository::find_by_token(pool, token).await? {
            Some(link) => link,
            None => return Ok(None),
        };
        if !link.is_active(Utc::now().naive_utc()) {
            return Ok(None);
        }
        let list = match ListRepository::find_by_id(pool, &link.list_id).await? {
            Some(list) => list,
            None => return Ok(None),
        };
        Ok(Some((link, list)))
    }

    /// Unexpired links of a list with their constructed bearer URLs.
    pub async fn list_active(
        pool: &SqlitePool,
        config: &Config,
        list_id: &str,
    ) -> AppResult<Vec<LinkSummary>> {
        let now = Utc::now().naive_utc();
        let links = ShareLinkRepository::list_active(pool, list_id, now).await?;

        Ok(links
            .into_iter()
            .map(|l| LinkSummary {
                url: Self::bearer_url(config, &l.token),
                id: l.id,
                can_add: l.can_add,
                can_edit: l.can_edit,
                can_delete: l.can_delete,
                can_toggle: l.can_toggle,
                expires_at: l.expires_at.and_utc().to_rfc3339(),
            })
            .collect())
    }

    /// The URL handed to third parties; the token is the whole credential.
    pub fn bearer_url(config: &Config, token: &str) -> String {
        format!(
            "{}/l/{}",
            config.server.public_url.trim_end_matches('/'),
            token
        )
    }

    /// Consume a link token stashed during login: when it still resolves and
    /// the user neither owns nor belongs to the target list, stage a pending
    /// acceptance in the session for explicit confirmation. Auto-joining
    /// here would let any link click silently rewrite the user's
    /// memberships.
    pub async fn stage_pending(
        pool: &SqlitePool,
        session: &mut Session,
        user_id: &str,
    ) -> AppResult<Option<PendingInvite>> {
        let token = match session.link_token.take() {
            Some(token) => token,
            None => return Ok(None),
        };

        let staged = match Self::resolve(pool, &token).await? {
            Some((_, list)) if list.owner_id != user_id => {
                if MembershipRepository::exists(pool, &list.id, user_id).await? {
                    None
                } else {
                    session.pending_link_token = Some(token);
                    session.pending_link_list_name = Some(list.name.clone());
                    Some(PendingInvite {
                        list_name: list.name,
                    })
                }
            }
            _ => None,
        };

        SessionRepository::save(pool, session).await?;
        Ok(staged)
    }

    /// Confirm the staged acceptance: idempotently create the membership and
    /// make the joined list the session's active one. Returns the list, or
    /// `None` when nothing was staged or the link died in the meantime (the
    /// staged state is discarded either way).
    pub async fn accept_pending(
        pool: &SqlitePool,
        session: &mut Session,
        user_id: &str,
    ) -> AppResult<Option<List>> {
        let token = match session.pending_link_token.clone() {
            Some(token) => token,
            None => return Ok(None),
        };
        session.clear_pending();

        match Self::resolve(pool, &token).await? {
            Some((_, list)) => {
                MembershipRepository::get_or_create(pool, &list.id, user_id).await?;
                session.active_list_id = Some(list.id.clone());
                SessionRepository::save(pool, session).await?;
                // Selection sanity: the joined list is accessible by construction
                ActiveListService::resolve(pool, session, user_id).await?;
                Ok(Some(list))
            }
            None => {
                SessionRepository::save(pool, session).await?;
                Ok(None)
            }
        }
    }

    /// Discard the staged acceptance without joining.
    pub async fn reject_pending(pool: &SqlitePool, session: &mut Session) -> AppResult<()> {
        session.clear_pending();
        SessionRepository::save(pool, session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util;
    use crate::db::UserRepository;

    fn caps_toggle_only() -> CapabilitySet {
        CapabilitySet {
            toggle: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn duration_is_clamped_and_defaulted() {
        let pool = test_util::pool().await;
        let config = Config::default();
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        let before = Utc::now().naive_utc();

        // Zero/negative amounts clamp to one unit
        let clamped = ShareLinkService::issue(&pool, &config, &list.id, 0, "minutes", caps_toggle_only())
            .await
            .unwrap();
        assert!(clamped.expires_at > before);
        assert!(clamped.expires_at <= before + Duration::minutes(2));

        // Unparsable unit falls back to the configured 24 hours
        let defaulted = ShareLinkService::issue(&pool, &config, &list.id, 7, "fortnights", caps_toggle_only())
            .await
            .unwrap();
        assert!(defaulted.expires_at > before + Duration::hours(23));
        assert!(defaulted.expires_at <= before + Duration::hours(25));
    }

    #[tokio::test]
    async fn resolve_hides_expired_and_unknown_tokens_alike() {
        let pool = test_util::pool().await;
        let config = Config::default();
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        let link = ShareLinkService::issue(&pool, &config, &list.id, 1, "hours", caps_toggle_only())
            .await
            .unwrap();
        assert!(ShareLinkService::resolve(&pool, &link.token)
            .await
            .unwrap()
            .is_some());

        let expired = ShareLinkRepository::create(
            &pool,
            &list.id,
            Utc::now().naive_utc() - Duration::hours(1),
            caps_toggle_only(),
        )
        .await
        .unwrap();

        assert!(ShareLinkService::resolve(&pool, &expired.token)
            .await
            .unwrap()
            .is_none());
        assert!(ShareLinkService::resolve(&pool, "never-existed")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn staged_acceptance_requires_explicit_confirm() {
        let pool = test_util::pool().await;
        let config = Config::default();
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        let link = ShareLinkService::issue(&pool, &config, &list.id, 1, "days", caps_toggle_only())
            .await
            .unwrap();

        let mut session = SessionRepository::create(&pool, &rui.id).await.unwrap();
        session.link_token = Some(link.token.clone());
        SessionRepository::save(&pool, &mut session).await.unwrap();

        let staged = ShareLinkService::stage_pending(&pool, &mut session, &rui.id)
            .await
            .unwrap()
            .expect("invite staged");
        assert_eq!(staged.list_name, "Casa");
        assert!(session.link_token.is_none());

        // Staging alone grants nothing
        assert!(!MembershipRepository::exists(&pool, &list.id, &rui.id)
            .await
            .unwrap());

        let joined = ShareLinkService::accept_pending(&pool, &mut session, &rui.id)
            .await
            .unwrap()
            .expect("joined list");
        assert_eq!(joined.id, list.id);
        assert!(MembershipRepository::exists(&pool, &list.id, &rui.id)
            .await
            .unwrap());
        assert_eq!(session.active_list_id.as_deref(), Some(list.id.as_str()));
        assert!(session.pending_link_token.is_none());
    }

    #[tokio::test]
    async fn owner_and_existing_member_are_not_staged() {
        let pool = test_util::pool().await;
        let config = Config::default();
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();
        let link = ShareLinkService::issue(&pool, &config, &list.id, 1, "days", caps_toggle_only())
            .await
            .unwrap();

        // Owner following their own link
        let mut owner_session = SessionRepository::create(&pool, &ana.id).await.unwrap();
        owner_session.link_token = Some(link.token.clone());
        assert!(ShareLinkService::stage_pending(&pool, &mut owner_session, &ana.id)
            .await
            .unwrap()
            .is_none());

        // Existing member following the link again
        MembershipRepository::get_or_create(&pool, &list.id, &rui.id)
            .await
            .unwrap();
        let mut member_session = SessionRepository::create(&pool, &rui.id).await.unwrap();
        member_session.link_token = Some(link.token);
        assert!(ShareLinkService::stage_pending(&pool, &mut member_session, &rui.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn reject_discards_staged_state_only() {
        let pool = test_util::pool().await;
        let config = Config::default();
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();
        let link = ShareLinkService::issue(&pool, &config, &list.id, 1, "days", caps_toggle_only())
            .await
            .unwrap();

        let mut session = SessionRepository::create(&pool, &rui.id).await.unwrap();
        session.link_token = Some(link.token);
        ShareLinkService::stage_pending(&pool, &mut session, &rui.id)
            .await
            .unwrap();

        ShareLinkService::reject_pending(&pool, &mut session).await.unwrap();
        assert!(session.pending_link_token.is_none());
        assert!(!MembershipRepository::exists(&pool, &list.id, &rui.id)
            .await
            .unwrap());
    }
}
