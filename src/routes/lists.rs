use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::models::CapabilitySet;
use crate::db::{
    ListRepository, MembershipRepository, SessionRepository, ShareLinkRepository, UserRepository,
};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::routes::auth::AuthSession;
use crate::services::access::AccessControl;
use crate::services::active_list::ActiveListService;
use crate::services::share_links::{LinkSummary, ShareLinkService};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_lists).post(create_list))
        .route("/:id", delete(delete_list))
        .route("/:id/select", post(select_list))
        .route("/:id/share", post(share_list))
        .route("/:id/members", get(list_members))
        .route("/:id/members/:user_id", delete(revoke_member))
        .route("/:id/links", get(list_links).post(issue_link))
        .route("/:id/links/:link_id", delete(revoke_link))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ListInfo {
    pub id: String,
    pub name: String,
    pub is_owner: bool,
}

#[derive(Debug, Serialize)]
pub struct ListsResponse {
    pub lists: Vec<ListInfo>,
    pub active_list_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub username: String,
}

/// Success/failure indicator plus a human-readable message; share outcomes
/// are recoverable, never fatal.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueLinkRequest {
    pub amount: i64,
    /// "minutes" | "hours" | "days"; anything else falls back to the
    /// configured default lifetime.
    pub unit: String,
    #[serde(default)]
    pub can_add: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub can_toggle: bool,
}

#[derive(Debug, Serialize)]
pub struct MemberInfo {
    pub user_id: String,
    pub username: String,
    pub since: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// All lists visible to the user, ordered by name, plus the (self-healed)
/// active selection.
async fn list_lists(
    State(state): State<Arc<AppState>>,
    AuthSession { mut session, user }: AuthSession,
) -> AppResult<Json<ListsResponse>> {
    let active = ActiveListService::resolve(&state.db, &mut session, &user.id).await?;
    let lists = ListRepository::accessible_to(&state.db, &user.id).await?;

    Ok(Json(ListsResponse {
        lists: lists
            .into_iter()
            .map(|l| ListInfo {
                is_owner: l.owner_id == user.id,
                id: l.id,
                name: l.name,
            })
            .collect(),
        active_list_id: active.map(|l| l.id),
    }))
}

async fn create_list(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Json(request): Json<CreateListRequest>,
) -> AppResult<Json<ListInfo>> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(i18n::t("validation.list_name_required")));
    }

    let list = ListRepository::create(&state.db, &user.id, name).await?;

    Ok(Json(ListInfo {
        id: list.id,
        name: list.name,
        is_owner: true,
    }))
}

/// Owner-only; cascades items, memberships and links. A stale active
/// selection in this session is cleared here, other sessions self-heal on
/// their next resolve.
async fn delete_list(
    State(state): State<Arc<AppState>>,
    AuthSession { mut session, user }: AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = ListRepository::delete_owned(&state.db, &id, &user.id).await?;
    if !deleted {
        return Err(AppError::NotFound(i18n::t("not_found.list")));
    }

    if session.active_list_id.as_deref() == Some(id.as_str()) {
        session.active_list_id = None;
        SessionRepository::save(&state.db, &mut session).await?;
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn select_list(
    State(state): State<Arc<AppState>>,
    AuthSession { mut session, user }: AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<ListInfo>> {
    match ActiveListService::select(&state.db, &mut session, &user.id, &id).await? {
        Some(list) => Ok(Json(ListInfo {
            is_owner: list.owner_id == user.id,
            id: list.id,
            name: list.name,
        })),
        // Inaccessible lists look absent
        None => Err(AppError::NotFound(i18n::t("not_found.list"))),
    }
}

/// Share a list with another registered user. Idempotent: re-sharing reports
/// success with an "already shared" message.
async fn share_list(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path(id): Path<String>,
    Json(request): Json<ShareRequest>,
) -> AppResult<Json<ShareResponse>> {
    let list = AccessControl::require_owned(&state.db, &user.id, &id).await?;

    let username = request.username.trim();
    if username == user.username {
        return Ok(Json(ShareResponse {
            ok: false,
            message: i18n::t("share.self_share"),
        }));
    }

    let target = match UserRepository::find_by_username(&state.db, username).await? {
        Some(target) => target,
        None => {
            return Ok(Json(ShareResponse {
                ok: false,
                message: i18n::t_with("share.user_not_found", &[("username", username)]),
            }))
        }
    };

    let (_, created) = MembershipRepository::get_or_create(&state.db, &list.id, &target.id).await?;

    let message = if created {
        tracing::info!("List {} shared with {}", list.id, target.username);
        i18n::t_with("share.created", &[("username", username)])
    } else {
        i18n::t_with("share.already_shared", &[("username", username)])
    };

    Ok(Json(ShareResponse { ok: true, message }))
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<MemberInfo>>> {
    let list = AccessControl::require_owned(&state.db, &user.id, &id).await?;
    let members = MembershipRepository::list_with_user_info(&state.db, &list.id).await?;

    Ok(Json(
        members
            .into_iter()
            .map(|(m, username)| MemberInfo {
                user_id: m.user_id,
                username,
                since: m.created_at.and_utc().to_rfc3339(),
            })
            .collect(),
    ))
}

async fn revoke_member(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path((id, member_id)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let list = AccessControl::require_owned(&state.db, &user.id, &id).await?;

    let removed = MembershipRepository::delete(&state.db, &list.id, &member_id).await?;
    if !removed {
        return Err(AppError::NotFound(i18n::t("not_found.member")));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Owner-only: mint a capability-scoped expiring bearer link.
async fn issue_link(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path(id): Path<String>,
    Json(request): Json<IssueLinkRequest>,
) -> AppResult<Json<LinkSummary>> {
    let list = AccessControl::require_owned(&state.db, &user.id, &id).await?;

    let link = ShareLinkService::issue(
        &state.db,
        &state.config,
        &list.id,
        request.amount,
        &request.unit,
        CapabilitySet {
            add: request.can_add,
            edit: request.can_edit,
            delete: request.can_delete,
            toggle: request.can_toggle,
        },
    )
    .await?;

    tracing::info!("Issued share link {} for list {}", link.id, list.id);

    Ok(Json(LinkSummary {
        url: ShareLinkService::bearer_url(&state.config, &link.token),
        id: link.id,
        can_add: link.can_add,
        can_edit: link.can_edit,
        can_delete: link.can_delete,
        can_toggle: link.can_toggle,
        expires_at: link.expires_at.and_utc().to_rfc3339(),
    }))
}

/// Owner-only audit of outstanding (unexpired) links.
async fn list_links(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<LinkSummary>>> {
    let list = AccessControl::require_owned(&state.db, &user.id, &id).await?;
    let links = ShareLinkService::list_active(&state.db, &state.config, &list.id).await?;
    Ok(Json(links))
}

async fn revoke_link(
    State(state): State<Arc<AppState>>,
    AuthSession { user, .. }: AuthSession,
    Path((id, link_id)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let list = AccessControl::require_owned(&state.db, &user.id, &id).await?;

    let removed = ShareLinkRepository::delete_for_list(&state.db, &list.id, &link_id).await?;
    if !removed {
        return Err(AppError::NotFound(i18n::t("not_found.link")));
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::db::test_util;
    use crate::services::credentials::CredentialService;

    async fn authed_state() -> (Arc<AppState>, String, crate::db::models::User) {
        let pool = test_util::pool().await;
        let config = Config::default();
        let user = CredentialService::register(&pool, &config, "ana", "segredo", false)
            .await
            .unwrap();
        let session = SessionRepository::create(&pool, &user.id).await.unwrap();
        let token = CredentialService::create_jwt(&config, &session.id).unwrap();
        (Arc::new(AppState { db: pool, config }), token, user)
    }

    #[tokio::test]
    async fn self_share_is_rejected_and_creates_no_membership() {
        let (state, token, ana) = authed_state().await;
        let list = ListRepository::accessible_to(&state.db, &ana.id)
            .await
            .unwrap()
            .remove(0);

        let app = router().with_state(state.clone());
        let response = app
            .oneshot(
                http::Request::builder()
                    .method(http::Method::POST)
                    .uri(format!("/{}/share", list.id))
                    .header(http::header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username": "ana"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["ok"], false);
        assert_eq!(parsed["message"], i18n::t("share.self_share"));

        // The rejection must leave the owner without a membership row
        assert!(!MembershipRepository::exists(&state.db, &list.id, &ana.id)
            .await
            .unwrap());
    }
}
