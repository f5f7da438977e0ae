use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::models::{Item, List, Operation, ShareLink};
use crate::db::ItemRepository;
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::routes::auth::AuthSession;
use crate::routes::items::{item_view, ItemRequest, ItemView};
use crate::services::access::AccessControl;
use crate::services::change_feed::{ChangeFeed, PollState};
use crate::services::items::{bump_quantity, normalize_quantity, Direction};
use crate::services::share_links::ShareLinkService;
use crate::AppState;

/// Anonymous bearer surface: everything is addressed by the link token and
/// scoped to exactly one list. No session is involved (except for `claim`,
/// which stages the link against an authenticated session).
pub fn bearer_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:token", get(view))
        .route("/:token/poll", get(poll))
        .route("/:token/claim", post(claim))
        .route("/:token/items", post(add_item))
        .route("/:token/items/:id", put(edit_item).delete(delete_item))
        .route("/:token/items/:id/toggle", post(toggle_item))
        .route("/:token/items/:id/quantity/:direction", post(adjust_quantity))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LinkViewResponse {
    pub list_name: String,
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_toggle: bool,
    pub pantry: Vec<ItemView>,
    pub to_buy: Vec<ItemView>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn view(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> AppResult<Json<LinkViewResponse>> {
    let (link, list) = resolve_link(&state.db, &token).await?;

    let items = ItemRepository::list_for_list(&state.db, &list.id).await?;
    let (to_buy, pantry): (Vec<_>, Vec<_>) = items.into_iter().partition(|i| i.to_buy);

    Ok(Json(LinkViewResponse {
        list_name: list.name,
        can_add: link.can_add,
        can_edit: link.can_edit,
        can_delete: link.can_delete,
        can_toggle: link.can_toggle,
        pantry: pantry.into_iter().map(item_view).collect(),
        to_buy: to_buy.into_iter().map(item_view).collect(),
    }))
}

async fn poll(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> AppResult<Json<PollState>> {
    let (_, list) = resolve_link(&state.db, &token).await?;
    let poll = ChangeFeed::poll(&state.db, Some(&list.id)).await?;
    Ok(Json(poll))
}

/// Stage the link against the caller's session for explicit acceptance.
async fn claim(
    State(state): State<Arc<AppState>>,
    AuthSession { mut session, user }: AuthSession,
    Path(token): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    // Even for a logged-in user, following a link never auto-joins.
    session.link_token = Some(token);
    let pending = ShareLinkService::stage_pending(&state.db, &mut session, &user.id).await?;

    Ok(Json(serde_json::json!({ "pending": pending })))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(request): Json<ItemRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let (link, list) = resolve_link(&state.db, &token).await?;
    if !AccessControl::can_perform(&link, Operation::Add, Utc::now().naive_utc()) {
        return ok_noop();
    }

    let name = request.name.trim();
    if name.is_empty() {
        return ok_noop();
    }

    let quantity = normalize_quantity(&request.quantity);
    ItemRepository::create(&state.db, &list.id, name, &quantity, true).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn edit_item(
    State(state): State<Arc<AppState>>,
    Path((token, id)): Path<(String, String)>,
    Json(request): Json<ItemRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let (link, list) = resolve_link(&state.db, &token).await?;
    if !AccessControl::can_perform(&link, Operation::Edit, Utc::now().naive_utc()) {
        return ok_noop();
    }

    let item = require_list_item(&state.db, &list, &id).await?;

    let name = request.name.trim();
    if name.is_empty() {
        return ok_noop();
    }

    let quantity = normalize_quantity(&request.quantity);
    ItemRepository::update_fields(&state.db, &item.id, name, &quantity).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path((token, id)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let (link, list) = resolve_link(&state.db, &token).await?;
    if !AccessControl::can_perform(&link, Operation::Delete, Utc::now().naive_utc()) {
        return ok_noop();
    }

    let item = require_list_item(&state.db, &list, &id).await?;
    ItemRepository::delete(&state.db, &item.id).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn toggle_item(
    State(state): State<Arc<AppState>>,
    Path((token, id)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let (link, list) = resolve_link(&state.db, &token).await?;
    if !AccessControl::can_perform(&link, Operation::Toggle, Utc::now().naive_utc()) {
        return ok_noop();
    }

    let item = require_list_item(&state.db, &list, &id).await?;
    ItemRepository::toggle(&state.db, &item.id).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Quantity adjustment is an edit-class operation.
async fn adjust_quantity(
    State(state): State<Arc<AppState>>,
    Path((token, id, direction)): Path<(String, String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let direction = Direction::from_path(&direction)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown direction: {}", direction)))?;

    let (link, list) = resolve_link(&state.db, &token).await?;
    if !AccessControl::can_perform(&link, Operation::Edit, Utc::now().naive_utc()) {
        return ok_noop();
    }

    let item = require_list_item(&state.db, &list, &id).await?;
    let quantity = bump_quantity(&item.quantity, direction);
    ItemRepository::set_quantity(&state.db, &item.id, &quantity).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Unknown and expired tokens are the same NotFound, so probing a URL after
/// expiry reveals nothing about whether it ever existed.
async fn resolve_link(pool: &SqlitePool, token: &str) -> AppResult<(ShareLink, List)> {
    ShareLinkService::resolve(pool, token)
        .await?
        .ok_or_else(|| AppError::NotFound(i18n::t("not_found.link")))
}

/// Items are only addressable through the link's own list.
async fn require_list_item(pool: &SqlitePool, list: &List, item_id: &str) -> AppResult<Item> {
    let item = ItemRepository::find_by_id(pool, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(i18n::t("not_found.item")))?;

    if item.list_id.as_deref() != Some(list.id.as_str()) {
        return Err(AppError::NotFound(i18n::t("not_found.item")));
    }

    Ok(item)
}

/// A mutation without the required capability performs nothing but still
/// answers success-shaped; no rejection reason is handed to the bearer.
fn ok_noop() -> AppResult<Json<serde_json::Value>> {
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::models::CapabilitySet;
    use crate::db::test_util;
    use crate::db::{ListRepository, SessionRepository, UserRepository};

    #[tokio::test]
    async fn items_are_not_addressable_across_lists() {
        let pool = test_util::pool().await;
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let casa = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();
        let praia = ListRepository::create(&pool, &ana.id, "Praia").await.unwrap();

        let item = ItemRepository::create(&pool, &casa.id, "Leite", "1", true)
            .await
            .unwrap();

        assert!(require_list_item(&pool, &casa, &item.id).await.is_ok());

        // The same item through another list's link looks absent
        let foreign = require_list_item(&pool, &praia, &item.id).await;
        assert!(matches!(foreign, Err(AppError::NotFound(_))));

        let missing = require_list_item(&pool, &casa, "no-such-item").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn add_without_capability_answers_ok_but_mutates_nothing() {
        let pool = test_util::pool().await;
        let config = Config::default();
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        let link = ShareLinkService::issue(
            &pool,
            &config,
            &list.id,
            1,
            "hours",
            CapabilitySet {
                toggle: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let state = Arc::new(crate::AppState { db: pool, config });
        let response = add_item(
            State(state.clone()),
            Path(link.token.clone()),
            Json(ItemRequest {
                name: "Leite".to_string(),
                quantity: String::new(),
            }),
        )
        .await
        .unwrap();

        // Success-shaped answer, but no item was created
        assert_eq!(response.0["ok"], true);
        let (_, count) = ItemRepository::poll_state(&state.db, &list.id)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn claim_stages_the_link_in_the_persisted_session() {
        let pool = test_util::pool().await;
        let config = Config::default();
        let ana = UserRepository::create(&pool, "ana", "h").await.unwrap();
        let rui = UserRepository::create(&pool, "rui", "h").await.unwrap();
        let list = ListRepository::create(&pool, &ana.id, "Casa").await.unwrap();

        let link = ShareLinkService::issue(
            &pool,
            &config,
            &list.id,
            1,
            "days",
            CapabilitySet {
                toggle: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let session = SessionRepository::create(&pool, &rui.id).await.unwrap();
        let state = Arc::new(crate::AppState { db: pool, config });

        let response = claim(
            State(state.clone()),
            AuthSession {
                session: session.clone(),
                user: rui,
            },
            Path(link.token.clone()),
        )
        .await
        .unwrap();
        assert_eq!(response.0["pending"]["list_name"], "Casa");

        // Staging round-trips through the session store; joining still waits
        // for an explicit accept
        let stored = SessionRepository::find_by_id(&state.db, &session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.pending_link_token.as_deref(), Some(link.token.as_str()));
        assert!(stored.link_token.is_none());
    }
}
