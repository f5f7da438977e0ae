use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::db::ListRepository;
use crate::error::AppResult;
use crate::routes::auth::AuthSession;
use crate::services::active_list::ActiveListService;
use crate::services::change_feed::ChangeFeed;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PollResponse {
    /// RFC 3339 timestamp of the active list's latest mutation, "" when
    /// there is none.
    pub updated_at: String,
    pub item_count: i64,
    /// Number of lists visible to the user; lets clients notice shares and
    /// revocations without a separate endpoint.
    pub list_count: i64,
}

/// Lightweight change probe for the session's active list. Clients compare
/// the whole tuple against the last-seen one and refetch on any difference.
pub async fn poll(
    State(state): State<Arc<AppState>>,
    AuthSession { mut session, user }: AuthSession,
) -> AppResult<Json<PollResponse>> {
    let active = ActiveListService::resolve(&state.db, &mut session, &user.id).await?;
    let feed = ChangeFeed::poll(&state.db, active.as_ref().map(|l| l.id.as_str())).await?;
    let list_count = ListRepository::count_accessible(&state.db, &user.id).await?;

    Ok(Json(PollResponse {
        updated_at: feed.updated_at,
        item_count: feed.item_count,
        list_count,
    }))
}
