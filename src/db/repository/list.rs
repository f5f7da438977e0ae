use chrono::Utc;

use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::List;
use crate::error::{AppError, AppResult};
use crate::i18n;

// ============================================================================
// List Repository
// ============================================================================

pub struct ListRepository;

impl ListRepository {
    /// Create a list for an owner. The UNIQUE(owner_id, name) constraint is
    /// the duplicate check, so two racing creates cannot both succeed; the
    /// loser gets the same validation error as a plain duplicate.
    pub async fn create(pool: &SqlitePool, owner_id: &str, name: &str) -> AppResult<List> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO lists (id, name, owner_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(owner_id)
        .bind(now)
        .execute(pool)
        .await;

        match result {
            Ok(_) => Ok(List {
                id,
                name: name.to_string(),
                owner_id: owner_id.to_string(),
                created_at: now,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Validation(i18n::t_with(
                    "validation.duplicate_list",
                    &[("name", name)],
                )))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<List>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, owner_id, created_at
            FROM lists
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|r| List {
            id: r.get("id"),
            name: r.get("name"),
            owner_id: r.get("owner_id"),
            created_at: r.get("created_at"),
        }))
    }

    /// True iff the user is the list's owner or holds a membership.
    pub async fn is_accessible(pool: &SqlitePool, user_id: &str, list_id: &str) -> AppResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present
            FROM lists l
            WHERE l.id = ?
              AND (l.owner_id = ?
                   OR EXISTS (SELECT 1 FROM memberships m
                              WHERE m.list_id = l.id AND m.user_id = ?))
            "#,
        )
        .bind(list_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.is_some())
    }

    /// All lists the user owns or is a member of, ordered by name for display.
    pub async fn accessible_to(pool: &SqlitePool, user_id: &str) -> AppResult<Vec<List>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.name, l.owner_id, l.created_at
            FROM lists l
            WHERE l.owner_id = ?
               OR EXISTS (SELECT 1 FROM memberships m
                          WHERE m.list_id = l.id AND m.user_id = ?)
            ORDER BY l.name ASC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| List {
                id: r.get("id"),
                name: r.get("name"),
                owner_id: r.get("owner_id"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    /// Fallback for active-list resolution: most recently created accessible list.
    pub async fn first_accessible(pool: &SqlitePool, user_id: &str) -> AppResult<Option<List>> {
        let row = sqlx::query(
            r#"
            SELECT l.id, l.name, l.owner_id, l.created_at
            FROM lists l
            WHERE l.owner_id = ?
               OR EXISTS (SELECT 1 FROM memberships m
                          WHERE m.list_id = l.id AND m.user_id = ?)
            ORDER BY l.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|r| List {
            id: r.get("id"),
            name: r.get("name"),
            owner_id: r.get("owner_id"),
            created_at: r.get("created_at"),
        }))
    }

    pub async fn count_accessible(pool: &SqlitePool, user_id: &str) -> AppResult<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n
            FROM lists l
            WHERE l.owner_id = ?
               OR EXISTS (SELECT 1 FROM memberships m
                          WHERE m.list_id = l.id AND m.user_id = ?)
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.get("n"))
    }

    /// Owner-only hard delete; cascades to items, memberships and share links.
    /// Returns false when the list does not exist or is not owned by `owner_id`.
    pub async fn delete_owned(pool: &SqlitePool, list_id: &str, owner_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM lists WHERE id = ? AND owner_id = ?")
            .bind(list_id)
            .bind(owner_id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util;
    use crate::db::UserRepository;

    #[tokio::test]
    async fn duplicate_name_rejected_per_owner_only() {
        let pool = test_util::pool().await;
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();

        ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        // The UNIQUE constraint violation surfaces as the validation error,
        // never as a raw database error
        let dup = ListRepository::create(&pool, &ana.id, "Casa").await;
        match dup {
            Err(AppError::Validation(msg)) => assert!(msg.contains("Casa")),
            other => panic!("expected validation error, got {:?}", other),
        }

        // Same name under a different owner is fine
        ListRepository::create(&pool, &rui.id, "Casa").await.unwrap();
    }

    #[tokio::test]
    async fn delete_owned_ignores_non_owner() {
        let pool = test_util::pool().await;
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        assert!(!ListRepository::delete_owned(&pool, &list.id, &rui.id)
            .await
            .unwrap());
        assert!(ListRepository::delete_owned(&pool, &list.id, &ana.id)
            .await
            .unwrap());
        assert!(ListRepository::find_by_id(&pool, &list.id)
            .await
            .unwrap()
            .is_none());
    }
}
