use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::SessionRepository;
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::credentials::CredentialService;
use crate::services::share_links::{PendingInvite, ShareLinkService};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    /// Expected to be the client-side SHA-256 pre-hash.
    pub secret: String,
    pub pre_hashed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub secret: String,
    /// Present on normal clients (true). Its absence marks the trusted
    /// first-party path that sends a raw password.
    pub pre_hashed: Option<bool>,
    /// Share-link token stashed client-side while the visitor was anonymous.
    pub link_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
    /// Set when a followed share link was staged for explicit acceptance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingInvite>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an account. A default list is provisioned alongside it and the
/// response carries a ready session token.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = CredentialService::register(
        &state.db,
        &state.config,
        &request.username,
        &request.secret,
        request.pre_hashed.unwrap_or(false),
    )
    .await?;

    let session = SessionRepository::create(&state.db, &user.id).await?;
    let token = CredentialService::create_jwt(&state.config, &session.id)?;

    tracing::info!("Registered user {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserInfo {
                id: user.id,
                username: user.username,
            },
            pending: None,
        }),
    ))
}

/// Verify credentials and open a session. Unknown username and wrong secret
/// produce the identical rejection.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = CredentialService::verify(
        &state.db,
        &request.username,
        &request.secret,
        request.pre_hashed.is_some(),
    )
    .await?
    .ok_or(AppError::Unauthorized)?;

    let mut session = SessionRepository::create(&state.db, &user.id).await?;

    // Consume a link the visitor followed before logging in; joining still
    // needs an explicit accept.
    let pending = match request.link_token {
        Some(token) => {
            session.link_token = Some(token);
            ShareLinkService::stage_pending(&state.db, &mut session, &user.id).await?
        }
        None => None,
    };

    let token = CredentialService::create_jwt(&state.config, &session.id)?;

    tracing::debug!("User {} logged in", user.username);

    Ok(Json(AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            username: user.username,
        },
        pending,
    }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    AuthSession { session, .. }: AuthSession,
) -> AppResult<Json<serde_json::Value>> {
    SessionRepository::delete(&state.db, &session.id).await?;
    Ok(Json(serde_json::json!({ "message": i18n::t("auth.logged_out") })))
}

async fn me(AuthSession { session, user }: AuthSession) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "user": { "id": user.id, "username": user.username },
        "active_list_id": session.active_list_id,
        "pending": session.pending_link_list_name.map(|name| serde_json::json!({ "list_name": name })),
    }))
}

// ============================================================================
// Extractors
// ============================================================================

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Extractor for the authenticated principal: bearer JWT -> session row ->
/// user. Handlers mutate the session value and persist it explicitly.
pub struct AuthSession {
    pub session: crate::db::models::Session,
    pub user: crate::db::models::User,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::debug!("Missing or invalid Authorization header");
                AppError::Unauthorized
            })?;

        if !auth_header.to_ascii_lowercase().starts_with("bearer ") {
            tracing::debug!("Authorization header doesn't start with 'Bearer '");
            return Err(AppError::Unauthorized);
        }

        let token = auth_header[7..].trim();
        if token.is_empty() {
            tracing::debug!("Empty bearer token in Authorization header");
            return Err(AppError::Unauthorized);
        }

        let (session, user) = CredentialService::session_from_token(state, token)
            .await
            .map_err(|e| {
                tracing::debug!("Failed to resolve session from token: {:?}", e);
                e
            })?;

        Ok(AuthSession { session, user })
    }
}
