use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::models::{Session, User};
use crate::db::{ListRepository, SessionRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Session id; the user hangs off the session row.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

pub struct CredentialService;

impl CredentialService {
    /// The transform clients are expected to apply before transmitting a
    /// password: lowercase hex SHA-256. The server never sees the plaintext
    /// on the normal login path.
    pub fn client_digest(secret: &str) -> String {
        hex::encode(Sha256::digest(secret.as_bytes()))
    }

    /// Verify a login attempt against the stored double-hashed credential.
    ///
    /// The stored value is bcrypt(client_digest(password)). The presented
    /// secret is normally the client digest itself. A raw password from the
    /// trusted first-party path is accepted by digesting it server-side, but
    /// only when the request did not carry a `pre_hashed` marker, so a real
    /// pre-hash mismatch is never masked.
    ///
    /// Unknown username and wrong secret return the same `None`.
    pub async fn verify(
        pool: &SqlitePool,
        username: &str,
        secret: &str,
        pre_hashed_supplied: bool,
    ) -> AppResult<Option<User>> {
        let user = match UserRepository::find_by_username(pool, username).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        if bcrypt::verify(secret, &user.password_hash)? {
            return Ok(Some(user));
        }

        if !pre_hashed_supplied
            && bcrypt::verify(Self::client_digest(secret), &user.password_hash)?
        {
            return Ok(Some(user));
        }

        Ok(None)
    }

    /// Register a user and auto-provision their default list.
    pub async fn register(
        pool: &SqlitePool,
        config: &Config,
        username: &str,
        secret: &str,
        pre_hashed: bool,
    ) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation(i18n::t("validation.username_required")));
        }
        if secret.is_empty() {
            return Err(AppError::Validation(i18n::t("validation.secret_required")));
        }

        let pre_hash = if pre_hashed {
            secret.to_string()
        } else {
            Self::client_digest(secret)
        };
        let password_hash = bcrypt::hash(pre_hash, bcrypt::DEFAULT_COST)?;

        let user = UserRepository::create(pool, username, &password_hash).await?;
        ListRepository::create(pool, &user.id, &config.app.default_list_name).await?;

        Ok(user)
    }

    /// Create a signed JWT whose subject is a session id.
    pub fn create_jwt(config: &Config, session_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(config.jwt.expiration_hours);
        let claims = Claims {
            sub: session_id.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Decode and validate a JWT, returning the claims.
    pub fn decode_jwt(config: &Config, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Resolve a bearer token to its session and user.
    pub async fn session_from_token(
        state: &Arc<AppState>,
        token: &str,
    ) -> AppResult<(Session, User)> {
        let claims = Self::decode_jwt(&state.config, token)?;
        let session = SessionRepository::find_by_id(&state.db, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let user = UserRepository::find_by_id(&state.db, &session.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok((session, user))
    }
}
