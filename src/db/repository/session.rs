use chrono::Utc;

use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::Session;
use crate::error::{AppError, AppResult};

// ============================================================================
// Session Repository
// ============================================================================

pub struct SessionRepository;

impl SessionRepository {
    pub async fn create(pool: &SqlitePool, user_id: &str) -> AppResult<Session> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, user_id, active_list_id,
                pending_link_token, pending_link_list_name, link_token,
                created_at, updated_at
            )
            VALUES (?, ?, NULL, NULL, NULL, NULL, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(Session {
            id,
            user_id: user_id.to_string(),
            active_list_id: None,
            pending_link_token: None,
            pending_link_list_name: None,
            link_token: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT
                id, user_id, active_list_id,
                pending_link_token, pending_link_list_name, link_token,
                created_at, updated_at
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|r| Session {
            id: r.get("id"),
            user_id: r.get("user_id"),
            active_list_id: r.get("active_list_id"),
            pending_link_token: r.get("pending_link_token"),
            pending_link_list_name: r.get("pending_link_list_name"),
            link_token: r.get("link_token"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// Persist the mutable session fields. Callers mutate the in-memory
    /// `Session` value and save it back explicitly.
    pub async fn save(pool: &SqlitePool, session: &mut Session) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE sessions
            SET
                active_list_id = ?,
                pending_link_token = ?,
                pending_link_list_name = ?,
                link_token = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&session.active_list_id)
        .bind(&session.pending_link_token)
        .bind(&session.pending_link_list_name)
        .bind(&session.link_token)
        .bind(now)
        .bind(&session.id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        session.updated_at = now;
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}
