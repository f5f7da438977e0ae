use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::db::models::{List, Operation, ShareLink};
use crate::db::ListRepository;
use crate::error::{AppError, AppResult};
use crate::i18n;

// ============================================================================
// Access Control
// ============================================================================
//
// Two kinds of principal reach a list: an authenticated user (owner or
// member) and an anonymous link-bearer (capability bits on an unexpired
// link). Anything a principal cannot prove access to surfaces as NotFound;
// there is no Forbidden in this layer, so probing reveals neither existence
// nor lifetimes.

pub struct AccessControl;

impl AccessControl {
    /// True iff the user owns the list or holds a membership on it.
    pub async fn can_access(pool: &SqlitePool, user_id: &str, list_id: &str) -> AppResult<bool> {
        ListRepository::is_accessible(pool, user_id, list_id).await
    }

    /// Load a list the user can access, collapsing "exists but not yours"
    /// into the same NotFound as true absence.
    pub async fn require_list(pool: &SqlitePool, user_id: &str, list_id: &str) -> AppResult<List> {
        let list = ListRepository::find_by_id(pool, list_id).await?;
        match list {
            Some(list) if Self::can_access(pool, user_id, &list.id).await? => Ok(list),
            _ => Err(AppError::NotFound(i18n::t("not_found.list"))),
        }
    }

    /// Load a list only for its owner; membership is not enough for the
    /// owner-only surfaces (share, links, delete).
    pub async fn require_owned(pool: &SqlitePool, user_id: &str, list_id: &str) -> AppResult<List> {
        let list = ListRepository::find_by_id(pool, list_id).await?;
        match list {
            Some(list) if list.owner_id == user_id => Ok(list),
            _ => Err(AppError::NotFound(i18n::t("not_found.list"))),
        }
    }

    /// Capability check for anonymous link-bearers: the link must be
    /// unexpired and carry the bit for the operation class.
    pub fn can_perform(link: &ShareLink, op: Operation, now: NaiveDateTime) -> bool {
        link.is_active(now) && link.capabilities().allows(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::CapabilitySet;
    use crate::db::test_util;
    use crate::db::{MembershipRepository, UserRepository};

    #[tokio::test]
    async fn require_list_collapses_foreign_lists_into_not_found() {
        let pool = test_util::pool().await;
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        let denied = AccessControl::require_list(&pool, &rui.id, &list.id).await;
        let missing = AccessControl::require_list(&pool, &rui.id, "no-such-id").await;
        assert!(matches!(denied, Err(AppError::NotFound(_))));
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        MembershipRepository::get_or_create(&pool, &list.id, &rui.id)
            .await
            .unwrap();
        assert!(AccessControl::require_list(&pool, &rui.id, &list.id)
            .await
            .is_ok());

        // Membership still does not satisfy the owner-only gate
        let not_owner = AccessControl::require_owned(&pool, &rui.id, &list.id).await;
        assert!(matches!(not_owner, Err(AppError::NotFound(_))));
    }

    #[test]
    fn expired_link_performs_nothing_regardless_of_bits() {
        let now = chrono::Utc::now().naive_utc();
        let link = ShareLink {
            id: "l".into(),
            list_id: "lst".into(),
            token: "t".into(),
            created_at: now,
            expires_at: now - chrono::Duration::minutes(1),
            can_add: true,
            can_edit: true,
            can_delete: true,
            can_toggle: true,
        };
        for op in [
            Operation::Add,
            Operation::Edit,
            Operation::Delete,
            Operation::Toggle,
        ] {
            assert!(!AccessControl::can_perform(&link, op, now));
        }

        let caps = CapabilitySet {
            toggle: true,
            ..Default::default()
        };
        let live = ShareLink {
            expires_at: now + chrono::Duration::minutes(1),
            can_add: caps.add,
            can_edit: caps.edit,
            can_delete: caps.delete,
            can_toggle: caps.toggle,
            ..link
        };
        assert!(AccessControl::can_perform(&live, Operation::Toggle, now));
        assert!(!AccessControl::can_perform(&live, Operation::Add, now));
    }
}
