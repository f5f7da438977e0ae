use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named shopping list. (`owner_id`, `name`) is unique; deleting the owner
/// or the list cascades to items, memberships and share links.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: NaiveDateTime,
}
