use sqlx::SqlitePool;

use crate::db::models::{List, Session};
use crate::db::{ListRepository, SessionRepository};
use crate::error::AppResult;
use crate::services::access::AccessControl;

// ============================================================================
// Active List Selector
// ============================================================================

pub struct ActiveListService;

impl ActiveListService {
    /// Resolve the session's current list.
    ///
    /// Sticky and self-healing: a stored selection that is still accessible
    /// wins; otherwise fall back to the most recently created accessible
    /// list and persist that selection as a side effect. With zero
    /// accessible lists the selection is cleared and `None` is returned —
    /// never an error.
    pub async fn resolve(
        pool: &SqlitePool,
        session: &mut Session,
        user_id: &str,
    ) -> AppResult<Option<List>> {
        if let Some(selected) = session.active_list_id.clone() {
            if AccessControl::can_access(pool, user_id, &selected).await? {
                if let Some(list) = ListRepository::find_by_id(pool, &selected).await? {
                    return Ok(Some(list));
                }
            }
        }

        match ListRepository::first_accessible(pool, user_id).await? {
            Some(list) => {
                if session.active_list_id.as_deref() != Some(list.id.as_str()) {
                    session.active_list_id = Some(list.id.clone());
                    SessionRepository::save(pool, session).await?;
                }
                Ok(Some(list))
            }
            None => {
                if session.active_list_id.is_some() {
                    session.active_list_id = None;
                    SessionRepository::save(pool, session).await?;
                }
                Ok(None)
            }
        }
    }

    /// Explicit selection; only takes effect when access control approves,
    /// otherwise the session is left unchanged.
    pub async fn select(
        pool: &SqlitePool,
        session: &mut Session,
        user_id: &str,
        list_id: &str,
    ) -> AppResult<Option<List>> {
        if !AccessControl::can_access(pool, user_id, list_id).await? {
            return Ok(None);
        }
        let list = ListRepository::find_by_id(pool, list_id).await?;
        if let Some(ref list) = list {
            session.active_list_id = Some(list.id.clone());
            SessionRepository::save(pool, session).await?;
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util;
    use crate::db::{MembershipRepository, UserRepository};

    #[tokio::test]
    async fn selection_is_sticky_and_self_healing() {
        let pool = test_util::pool().await;
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();

        let casa = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();
        let shared = ListRepository::create(&pool, &rui.id, "Praia").await.unwrap();
        MembershipRepository::get_or_create(&pool, &shared.id, &ana.id)
            .await
            .unwrap();

        let mut session = SessionRepository::create(&pool, &ana.id).await.unwrap();

        // First resolve falls back to the newest accessible list and persists it
        let resolved = ActiveListService::resolve(&pool, &mut session, &ana.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, shared.id);
        let stored = SessionRepository::find_by_id(&pool, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.active_list_id.as_deref(), Some(shared.id.as_str()));

        // Explicit select sticks
        ActiveListService::select(&pool, &mut session, &ana.id, &casa.id)
            .await
            .unwrap()
            .unwrap();
        let resolved = ActiveListService::resolve(&pool, &mut session, &ana.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, casa.id);

        // Selecting an inaccessible list leaves the session unchanged
        let other = ListRepository::create(&pool, &rui.id, "Privada").await.unwrap();
        let denied = ActiveListService::select(&pool, &mut session, &ana.id, &other.id)
            .await
            .unwrap();
        assert!(denied.is_none());
        assert_eq!(session.active_list_id.as_deref(), Some(casa.id.as_str()));

        // Losing access to the selected list heals to another accessible one
        ListRepository::delete_owned(&pool, &casa.id, &ana.id)
            .await
            .unwrap();
        let healed = ActiveListService::resolve(&pool, &mut session, &ana.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(healed.id, shared.id);

        // Losing everything resolves to none without raising
        MembershipRepository::delete(&pool, &shared.id, &ana.id)
            .await
            .unwrap();
        let none = ActiveListService::resolve(&pool, &mut session, &ana.id)
            .await
            .unwrap();
        assert!(none.is_none());
        assert!(session.active_list_id.is_none());
    }
}
