use chrono::{NaiveDateTime, Utc};

use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{CapabilitySet, ShareLink};
use crate::error::{AppError, AppResult};

// ============================================================================
// Share Link Repository
// ============================================================================

pub struct ShareLinkRepository;

impl ShareLinkRepository {
    /// Insert a link with a freshly generated unguessable token. The token is
    /// a v4 UUID (128 bits of CSPRNG output) used directly as a bearer
    /// credential.
    pub async fn create(
        pool: &SqlitePool,
        list_id: &str,
        expires_at: NaiveDateTime,
        caps: CapabilitySet,
    ) -> AppResult<ShareLink> {
        let id = Uuid::new_v4().to_string();
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO share_links (
                id, list_id, token, created_at, expires_at,
                can_add, can_edit, can_delete, can_toggle
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(list_id)
        .bind(&token)
        .bind(now)
        .bind(expires_at)
        .bind(caps.add)
        .bind(caps.edit)
        .bind(caps.delete)
        .bind(caps.toggle)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(ShareLink {
            id,
            list_id: list_id.to_string(),
            token,
            created_at: now,
            expires_at,
            can_add: caps.add,
            can_edit: caps.edit,
            can_delete: caps.delete,
            can_toggle: caps.toggle,
        })
    }

    /// Raw token lookup without the expiry filter; callers decide how an
    /// expired row surfaces (it must look identical to a missing one).
    pub async fn find_by_token(pool: &SqlitePool, token: &str) -> AppResult<Option<ShareLink>> {
        let row = sqlx::query(
            r#"
            SELECT id, list_id, token, created_at, expires_at,
                   can_add, can_edit, can_delete, can_toggle
            FROM share_links
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(Self::from_row))
    }

    /// Outstanding (unexpired) links of a list, newest first. Expired rows
    /// persist but are never listed.
    pub async fn list_active(
        pool: &SqlitePool,
        list_id: &str,
        now: NaiveDateTime,
    ) -> AppResult<Vec<ShareLink>> {
        let rows = sqlx::query(
            r#"
            SELECT id, list_id, token, created_at, expires_at,
                   can_add, can_edit, can_delete, can_toggle
            FROM share_links
            WHERE list_id = ? AND expires_at > ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(list_id)
        .bind(now)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    /// Hard delete, scoped to the owning list. Returns false when no row matched.
    pub async fn delete_for_list(
        pool: &SqlitePool,
        list_id: &str,
        link_id: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM share_links WHERE id = ? AND list_id = ?")
            .bind(link_id)
            .bind(list_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    fn from_row(r: sqlx::sqlite::SqliteRow) -> ShareLink {
        ShareLink {
            id: r.get("id"),
            list_id: r.get("list_id"),
            token: r.get("token"),
            created_at: r.get("created_at"),
            expires_at: r.get("expires_at"),
            can_add: r.get("can_add"),
            can_edit: r.get("can_edit"),
            can_delete: r.get("can_delete"),
            can_toggle: r.get("can_toggle"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util;
    use crate::db::{ListRepository, UserRepository};

    #[tokio::test]
    async fn expired_links_are_not_listed_but_persist() {
        let pool = test_util::pool().await;
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        let now = Utc::now().naive_utc();
        let live = ShareLinkRepository::create(
            &pool,
            &list.id,
            now + chrono::Duration::hours(1),
            CapabilitySet {
                toggle: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let expired = ShareLinkRepository::create(
            &pool,
            &list.id,
            now - chrono::Duration::hours(1),
            CapabilitySet::default(),
        )
        .await
        .unwrap();

        let active = ShareLinkRepository::list_active(&pool, &list.id, now)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, live.id);

        // No sweeper: the expired row is still there for a raw lookup.
        assert!(ShareLinkRepository::find_by_token(&pool, &expired.token)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn delete_is_scoped_to_the_list() {
        let pool = test_util::pool().await;
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let casa = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();
        let praia = ListRepository::create(&pool, &ana.id, "Praia").await.unwrap();

        let now = Utc::now().naive_utc();
        let link = ShareLinkRepository::create(
            &pool,
            &casa.id,
            now + chrono::Duration::hours(1),
            CapabilitySet::default(),
        )
        .await
        .unwrap();

        assert!(!ShareLinkRepository::delete_for_list(&pool, &praia.id, &link.id)
            .await
            .unwrap());
        assert!(ShareLinkRepository::delete_for_list(&pool, &casa.id, &link.id)
            .await
            .unwrap());
    }
}
