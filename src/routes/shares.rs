use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::AppResult;
use crate::i18n;
use crate::routes::auth::AuthSession;
use crate::services::share_links::ShareLinkService;
use crate::AppState;

/// Pending-invite lifecycle: a followed share link sits staged in the
/// session until the user explicitly accepts or rejects it here.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pending", get(pending))
        .route("/accept", post(accept))
        .route("/reject", post(reject))
}

async fn pending(
    AuthSession { session, .. }: AuthSession,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "pending": session
            .pending_link_list_name
            .map(|name| serde_json::json!({ "list_name": name })),
    }))
}

async fn accept(
    State(state): State<Arc<AppState>>,
    AuthSession { mut session, user }: AuthSession,
) -> AppResult<Json<serde_json::Value>> {
    if session.pending_link_token.is_none() {
        return Ok(Json(serde_json::json!({
            "ok": false,
            "message": i18n::t("share.no_pending"),
        })));
    }

    match ShareLinkService::accept_pending(&state.db, &mut session, &user.id).await? {
        Some(list) => {
            tracing::info!("User {} joined list {} via share link", user.id, list.id);
            Ok(Json(serde_json::json!({
                "ok": true,
                "message": i18n::t_with("share.accepted", &[("name", &list.name)]),
                "list": { "id": list.id, "name": list.name },
            })))
        }
        // The link expired or was revoked between staging and acceptance
        None => Ok(Json(serde_json::json!({
            "ok": false,
            "message": i18n::t("share.link_gone"),
        }))),
    }
}

async fn reject(
    State(state): State<Arc<AppState>>,
    AuthSession { mut session, .. }: AuthSession,
) -> AppResult<Json<serde_json::Value>> {
    ShareLinkService::reject_pending(&state.db, &mut session).await?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "message": i18n::t("share.rejected"),
    })))
}
