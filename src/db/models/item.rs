use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A pantry/shopping item. `quantity` is a short display string and is not
/// required to be numeric ("2x", "500g"). `to_buy` false means "in pantry".
/// `moved_at` is touched on every mutation and drives change detection.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    /// Nullable for legacy rows that predate lists; such items are not
    /// reachable through any list-scoped operation.
    pub list_id: Option<String>,
    pub name: String,
    pub quantity: String,
    pub to_buy: bool,
    pub created_at: NaiveDateTime,
    pub moved_at: NaiveDateTime,
}
