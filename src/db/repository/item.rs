use chrono::{NaiveDateTime, Utc};

use sqlx::Row;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::Item;
use crate::error::{AppError, AppResult};

// ============================================================================
// Item Repository
// ============================================================================

pub struct ItemRepository;

impl ItemRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Item>> {
        let row = sqlx::query(
            r#"
            SELECT id, list_id, name, quantity, to_buy, created_at, moved_at
            FROM items
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(Self::from_row))
    }

    /// Items of one list, most recently moved first.
    pub async fn list_for_list(pool: &SqlitePool, list_id: &str) -> AppResult<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT id, list_id, name, quantity, to_buy, created_at, moved_at
            FROM items
            WHERE list_id = ?
            ORDER BY moved_at DESC
            "#,
        )
        .bind(list_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    pub async fn create(
        pool: &SqlitePool,
        list_id: &str,
        name: &str,
        quantity: &str,
        to_buy: bool,
    ) -> AppResult<Item> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO items (id, list_id, name, quantity, to_buy, created_at, moved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(list_id)
        .bind(name)
        .bind(quantity)
        .bind(to_buy)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(Item {
            id,
            list_id: Some(list_id.to_string()),
            name: name.to_string(),
            quantity: quantity.to_string(),
            to_buy,
            created_at: now,
            moved_at: now,
        })
    }

    /// Rename / re-quantify an item. Touches `moved_at`.
    pub async fn update_fields(
        pool: &SqlitePool,
        id: &str,
        name: &str,
        quantity: &str,
    ) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE items
            SET name = ?, quantity = ?, moved_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(quantity)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn set_quantity(pool: &SqlitePool, id: &str, quantity: &str) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE items SET quantity = ?, moved_at = ? WHERE id = ?")
            .bind(quantity)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Flip between pantry and shopping list. Touches `moved_at`.
    pub async fn toggle(pool: &SqlitePool, id: &str) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE items SET to_buy = NOT to_buy, moved_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    /// Freshness tuple for the change feed: newest `moved_at` plus item count.
    pub async fn poll_state(
        pool: &SqlitePool,
        list_id: &str,
    ) -> AppResult<(Option<NaiveDateTime>, i64)> {
        let row = sqlx::query(
            r#"
            SELECT MAX(moved_at) AS last_moved, COUNT(*) AS n
            FROM items
            WHERE list_id = ?
            "#,
        )
        .bind(list_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        Ok((row.get("last_moved"), row.get("n")))
    }

    fn from_row(r: sqlx::sqlite::SqliteRow) -> Item {
        Item {
            id: r.get("id"),
            list_id: r.get("list_id"),
            name: r.get("name"),
            quantity: r.get("quantity"),
            to_buy: r.get("to_buy"),
            created_at: r.get("created_at"),
            moved_at: r.get("moved_at"),
        }
    }
}
