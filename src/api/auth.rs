//! Registration, login, and session handling.
//!
//! Passwords are hashed with Argon2. Session tokens are random, stored
//! hashed, and expire after a configurable number of days. There is no
//! process-wide current user: handlers receive the identity through the
//! `User` extractor, which resolves the token from the `Authorization`
//! header or the session cookie per request.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::catches;
use crate::db::{
    DbPool, LoginRequest, LoginResponse, RegisterRequest, Session, User, UserResponse,
    DEFAULT_PROFILE_IMG,
};
use crate::AppState;

use super::error::ApiError;
use super::validation;

/// Session token cookie name, shared by the HTML pages.
pub const SESSION_COOKIE: &str = "creel_session";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Insert a new user. A unique violation on username or email surfaces
/// as Conflict so callers can re-present the form.
pub async fn register_user(pool: &DbPool, req: &RegisterRequest) -> Result<User, ApiError> {
    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let profile_img = req
        .profile_img
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PROFILE_IMG);
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, profile_img, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&req.username)
    .bind(&req.email)
    .bind(&password_hash)
    .bind(profile_img)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| {
        let msg = e.to_string();
        if msg.contains("UNIQUE constraint failed: users.username") {
            ApiError::conflict("Username already taken")
        } else if msg.contains("UNIQUE constraint failed: users.email") {
            ApiError::conflict("Email already registered")
        } else {
            tracing::error!("Failed to create user: {}", e);
            ApiError::database("Failed to create user")
        }
    })?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await?;

    Ok(user)
}

/// Look up a user by username and verify the password. Unknown username
/// and wrong password are indistinguishable to the caller.
pub async fn authenticate(
    pool: &DbPool,
    username: &str,
    password: &str,
) -> Result<Option<User>, sqlx::Error> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    match user {
        Some(user) if verify_password(password, &user.password_hash) => Ok(Some(user)),
        _ => Ok(None),
    }
}

/// Create a session row and return the raw token. Also reconciles the
/// user's catch rows against the catalog; login is the one lifecycle
/// point where that happens.
pub async fn start_session(
    pool: &DbPool,
    user_id: i64,
    ttl_days: i64,
) -> Result<String, sqlx::Error> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let now = chrono::Utc::now();
    let expires_at = (now + chrono::Duration::days(ttl_days)).to_rfc3339();
    let session_id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(&token_hash)
    .bind(&expires_at)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    catches::ensure_catalog_rows(pool, user_id).await?;

    Ok(token)
}

/// Delete the session for a token. Unknown tokens are a no-op.
pub async fn end_session(pool: &DbPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve a token back to its user, if the session is still valid.
pub async fn resolve_session_user(
    pool: &DbPool,
    token: &str,
) -> Result<Option<User>, sqlx::Error> {
    let session: Option<Session> =
        sqlx::query_as("SELECT * FROM sessions WHERE token_hash = ? AND expires_at > ?")
            .bind(hash_token(token))
            .bind(chrono::Utc::now().to_rfc3339())
            .fetch_optional(pool)
            .await?;

    let Some(session) = session else {
        return Ok(None);
    };

    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(session.user_id)
        .fetch_optional(pool)
        .await
}

/// Pull the session token from a request: Bearer header first, then the
/// session cookie set by the HTML pages.
pub fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(token) = header.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Extractor for the current authenticated user.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for User {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_token(parts).ok_or_else(|| ApiError::unauthorized("Not logged in"))?;
        resolve_session_user(&state.db, &token)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))
    }
}

/// Build the session cookie for a freshly issued token.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Register a new user and log them in
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<LoginResponse>), ApiError> {
    validation::validate_registration(&req)?;

    let user = register_user(&state.db, &req).await?;
    let token = start_session(&state.db, user.id, state.config.auth.session_ttl_days).await?;

    tracing::info!(username = %user.username, "New user registered");

    let jar = jar.add(session_cookie(token.clone()));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(LoginResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

/// Log in with username and password
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let user = authenticate(&state.db, &req.username, &req.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let token = start_session(&state.db, user.id, state.config.auth.session_ttl_days).await?;

    let jar = jar.add(session_cookie(token.clone()));
    Ok((
        jar,
        Json(LoginResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

/// Log out the current session
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        end_session(&state.db, cookie.value()).await?;
    }
    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Get the current user
///
/// GET /api/auth/me
pub async fn me(user: User) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn req(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "hunter2sequel".to_string(),
            profile_img: None,
        }
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[tokio::test]
    async fn register_assigns_default_avatar() {
        let pool = test_pool().await;
        let user = register_user(&pool, &req("flick", "flick@example.com"))
            .await
            .unwrap();
        assert_eq!(user.profile_img, DEFAULT_PROFILE_IMG);
        assert_ne!(user.password_hash, "hunter2sequel");
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let pool = test_pool().await;
        register_user(&pool, &req("flick", "flick@example.com"))
            .await
            .unwrap();

        let err = register_user(&pool, &req("flick", "other@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::api::error::ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let pool = test_pool().await;
        register_user(&pool, &req("flick", "flick@example.com"))
            .await
            .unwrap();

        let err = register_user(&pool, &req("cj", "flick@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::api::error::ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn authenticate_fails_uniformly() {
        let pool = test_pool().await;
        register_user(&pool, &req("flick", "flick@example.com"))
            .await
            .unwrap();

        let ok = authenticate(&pool, "flick", "hunter2sequel").await.unwrap();
        assert_eq!(ok.unwrap().username, "flick");

        // Wrong password and unknown username look the same.
        assert!(authenticate(&pool, "flick", "nope").await.unwrap().is_none());
        assert!(authenticate(&pool, "ghost", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_round_trip_and_logout() {
        let pool = test_pool().await;
        let user = register_user(&pool, &req("flick", "flick@example.com"))
            .await
            .unwrap();

        let token = start_session(&pool, user.id, 7).await.unwrap();
        let resolved = resolve_session_user(&pool, &token).await.unwrap();
        assert_eq!(resolved.unwrap().id, user.id);

        end_session(&pool, &token).await.unwrap();
        assert!(resolve_session_user(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_does_not_resolve() {
        let pool = test_pool().await;
        let user = register_user(&pool, &req("flick", "flick@example.com"))
            .await
            .unwrap();

        let token = start_session(&pool, user.id, -1).await.unwrap();
        assert!(resolve_session_user(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_reconciles_catch_rows() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO fish (name, icon_url) VALUES ('A', 'https://x/a.png'), ('B', 'https://x/b.png')")
            .execute(&pool)
            .await
            .unwrap();

        let user = register_user(&pool, &req("flick", "flick@example.com"))
            .await
            .unwrap();
        start_session(&pool, user.id, 7).await.unwrap();

        let board = crate::catches::list_for_user(&pool, user.id).await.unwrap();
        assert_eq!(board.len(), 2);
        assert!(board.iter().all(|f| !f.is_caught));
    }
}
