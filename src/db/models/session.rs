use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Server-side per-principal session state, addressed by the JWT subject.
///
/// Holds the sticky active-list selection plus the staged link-acceptance
/// fields. Handlers load it, mutate it and persist it explicitly; there is
/// no ambient per-request state.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub active_list_id: Option<String>,
    /// Token of a share link staged for explicit acceptance.
    pub pending_link_token: Option<String>,
    /// Display name of the staged link's list, shown in the confirm prompt.
    pub pending_link_list_name: Option<String>,
    /// Transient token stashed when a visitor followed a link before
    /// authenticating; consumed on login.
    pub link_token: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Session {
    pub fn clear_pending(&mut self) {
        self.pending_link_token = None;
        self.pending_link_list_name = None;
    }
}
