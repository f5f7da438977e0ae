use chrono::Utc;

use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::Membership;
use crate::error::{AppError, AppResult};

// ============================================================================
// Membership Repository
// ============================================================================

pub struct MembershipRepository;

impl MembershipRepository {
    /// Idempotent share: inserting an existing (list, user) pair is a no-op.
    /// Returns the membership and whether this call created it.
    pub async fn get_or_create(
        pool: &SqlitePool,
        list_id: &str,
        user_id: &str,
    ) -> AppResult<(Membership, bool)> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO memberships (id, list_id, user_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (list_id, user_id) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(list_id)
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        let created = result.rows_affected() > 0;

        let row = sqlx::query(
            r#"
            SELECT id, list_id, user_id, created_at
            FROM memberships
            WHERE list_id = ? AND user_id = ?
            "#,
        )
        .bind(list_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok((
            Membership {
                id: row.get("id"),
                list_id: row.get("list_id"),
                user_id: row.get("user_id"),
                created_at: row.get("created_at"),
            },
            created,
        ))
    }

    pub async fn exists(pool: &SqlitePool, list_id: &str, user_id: &str) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 AS present FROM memberships WHERE list_id = ? AND user_id = ?")
            .bind(list_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(row.is_some())
    }

    /// Owner revocation. Returns false when no such share existed.
    pub async fn delete(pool: &SqlitePool, list_id: &str, user_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM memberships WHERE list_id = ? AND user_id = ?")
            .bind(list_id)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Memberships of a list along with member usernames, newest first.
    pub async fn list_with_user_info(
        pool: &SqlitePool,
        list_id: &str,
    ) -> AppResult<Vec<(Membership, String)>> {
        let rows = sqlx::query(
            r#"
            SELECT
                m.id, m.list_id, m.user_id, m.created_at,
                u.username
            FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.list_id = ?
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(list_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    Membership {
                        id: r.get("id"),
                        list_id: r.get("list_id"),
                        user_id: r.get("user_id"),
                        created_at: r.get("created_at"),
                    },
                    r.get("username"),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util;
    use crate::db::{ListRepository, UserRepository};

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let pool = test_util::pool().await;
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        let (first, created) = MembershipRepository::get_or_create(&pool, &list.id, &rui.id)
            .await
            .unwrap();
        assert!(created);

        let (second, created_again) = MembershipRepository::get_or_create(&pool, &list.id, &rui.id)
            .await
            .unwrap();
        assert!(!created_again);
        assert_eq!(first.id, second.id);

        let members = MembershipRepository::list_with_user_info(&pool, &list.id)
            .await
            .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].1, "rui");
    }

    #[tokio::test]
    async fn membership_gates_access() {
        let pool = test_util::pool().await;
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        assert!(!ListRepository::is_accessible(&pool, &rui.id, &list.id)
            .await
            .unwrap());

        MembershipRepository::get_or_create(&pool, &list.id, &rui.id)
            .await
            .unwrap();
        assert!(ListRepository::is_accessible(&pool, &rui.id, &list.id)
            .await
            .unwrap());

        MembershipRepository::delete(&pool, &list.id, &rui.id)
            .await
            .unwrap();
        assert!(!ListRepository::is_accessible(&pool, &rui.id, &list.id)
            .await
            .unwrap());
    }
}
