//! Session authentication: Argon2 password hashing and stateless bearer
//! tokens signed with the configured session secret.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::user::User;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Issued at, seconds since epoch.
    pub iat: i64,
}

/// Token payload returned by a successful login.
#[derive(Debug, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Sign a session token for `username`.
pub fn issue_session(
    username: &str,
    secret: &str,
    expiry_secs: i64,
) -> Result<SessionToken, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_string(),
        exp: now + expiry_secs,
        iat: now,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign session token: {e}")))?;

    Ok(SessionToken {
        token,
        token_type: "Bearer",
        expires_in: expiry_secs,
    })
}

/// Validate a bearer token and return its claims. Expired or tampered
/// tokens are unauthorized, never an internal error.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Verify credentials against the user table and issue a session token.
pub async fn login(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    secret: &str,
    expiry_secs: i64,
) -> Result<SessionToken, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    issue_session(&user.username, secret, expiry_secs)
}
