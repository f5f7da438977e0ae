use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Grants a non-owner user access to a list. (`list_id`, `user_id`) is unique.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub list_id: String,
    pub user_id: String,
    pub created_at: NaiveDateTime,
}
