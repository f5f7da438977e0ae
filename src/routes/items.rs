use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::models::Item;
use crate::db::ItemRepository;
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::routes::auth::AuthSession;
use crate::services::access::AccessControl;
use crate::services::active_list::ActiveListService;
use crate::services::items::{bump_quantity, normalize_quantity, Direction};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_items).post(add_item))
        .route("/:id", put(edit_item).delete(delete_item))
        .route("/:id/toggle", post(toggle_item))
        .route("/:id/quantity/:direction", post(adjust_quantity))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub quantity: String,
    pub to_buy: bool,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub list: Option<ActiveListInfo>,
    /// Items with `to_buy = false`.
    pub pantry: Vec<ItemView>,
    /// Items with `to_buy = true`.
    pub to_buy: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
pub struct ActiveListInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
}

// ============================================================================
// Handlers
// ============================================================================
//
// All operations here are scoped to the session's active list. With no
// accessible list every endpoint is a success-shaped no-op, so a fresh or
// fully unshared account never sees an error.

/// Items of the active list, split into pantry and shopping sections,
/// most recently moved first.
async fn list_items(
    State(state): State<Arc<AppState>>,
    AuthSession { mut session, user }: AuthSession,
) -> AppResult<Json<ItemsResponse>> {
    let list = match ActiveListService::resolve(&state.db, &mut session, &user.id).await? {
        Some(list) => list,
        None => {
            return Ok(Json(ItemsResponse {
                list: None,
                pantry: Vec::new(),
                to_buy: Vec::new(),
            }))
        }
    };

    let items = ItemRepository::list_for_list(&state.db, &list.id).await?;
    let (to_buy, pantry): (Vec<_>, Vec<_>) = items.into_iter().partition(|i| i.to_buy);

    Ok(Json(ItemsResponse {
        list: Some(ActiveListInfo {
            id: list.id,
            name: list.name,
        }),
        pantry: pantry.into_iter().map(item_view).collect(),
        to_buy: to_buy.into_iter().map(item_view).collect(),
    }))
}

/// Add an item to the active list's shopping section. Blank names make this
/// a no-op.
async fn add_item(
    State(state): State<Arc<AppState>>,
    AuthSession { mut session, user }: AuthSession,
    Json(request): Json<ItemRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let list = match ActiveListService::resolve(&state.db, &mut session, &user.id).await? {
        Some(list) => list,
        None => return Ok(Json(serde_json::json!({ "ok": true }))),
    };

    let name = request.name.trim();
    if name.is_empty() {
        return Ok(Json(serde_json::json!({ "ok": true })));
    }

    let quantity = normalize_quantity(&request.quantity);
    let item = ItemRepository::create(&state.db, &list.id, name, &quantity, true).await?;

    Ok(Json(serde_json::json!({ "ok": true, "item": item_view(item) })))
}

async fn edit_item(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path(id): Path<String>,
    Json(request): Json<ItemRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let item = require_item(&state.db, &user.id, &id).await?;

    let name = request.name.trim();
    if name.is_empty() {
        return Ok(Json(serde_json::json!({ "ok": true })));
    }

    let quantity = normalize_quantity(&request.quantity);
    ItemRepository::update_fields(&state.db, &item.id, name, &quantity).await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn delete_item(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let item = require_item(&state.db, &user.id, &id).await?;
    ItemRepository::delete(&state.db, &item.id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Move an item between pantry and shopping list.
async fn toggle_item(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let item = require_item(&state.db, &user.id, &id).await?;
    ItemRepository::toggle(&state.db, &item.id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Bump the quantity up or down by one. Note the rewrite discards any
/// non-numeric suffix the quantity carried.
async fn adjust_quantity(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path((id, direction)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let direction = Direction::from_path(&direction)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown direction: {}", direction)))?;

    let item = require_item(&state.db, &user.id, &id).await?;
    let quantity = bump_quantity(&item.quantity, direction);
    ItemRepository::set_quantity(&state.db, &item.id, &quantity).await?;

    Ok(Json(serde_json::json!({ "ok": true, "quantity": quantity })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Load an item the user may touch. Orphaned items (no list) and items on
/// lists the user cannot access surface as the same NotFound.
pub(crate) async fn require_item(
    pool: &SqlitePool,
    user_id: &str,
    item_id: &str,
) -> AppResult<Item> {
    let item = ItemRepository::find_by_id(pool, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(i18n::t("not_found.item")))?;

    let list_id = item
        .list_id
        .clone()
        .ok_or_else(|| AppError::NotFound(i18n::t("not_found.item")))?;

    if !AccessControl::can_access(pool, user_id, &list_id).await? {
        return Err(AppError::NotFound(i18n::t("not_found.item")));
    }

    Ok(item)
}

pub(crate) fn item_view(item: Item) -> ItemView {
    ItemView {
        id: item.id,
        name: item.name,
        quantity: item.quantity,
        to_buy: item.to_buy,
    }
}
