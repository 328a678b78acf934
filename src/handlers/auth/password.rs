use axum::Json;
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::password::{hash_password, validate_password_strength};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::error::ApiError;
use crate::services::mail;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
}

/// Generate a 64-hex-char reset token (32 random bytes)
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

const RESET_SENT_MESSAGE: &str =
    "If an account exists for that address, a password reset email has been sent";

/// POST /api/auth/forgot-password
///
/// Responds with the same message whether or not the account exists, so the
/// endpoint cannot be used to probe registered addresses.
pub async fn forgot_password(
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Ok(Json(json!({ "message": RESET_SENT_MESSAGE }))),
    };

    let token = generate_reset_token();
    let ttl = config::config().security.reset_token_ttl_minutes;
    let expires = Utc::now() + Duration::minutes(ttl);

    // Issuing a reset also revokes outstanding sessions
    sqlx::query(
        "UPDATE users SET reset_password_token = $1, reset_password_expires_at = $2, \
         token_version = token_version + 1 WHERE id = $3",
    )
    .bind(&token)
    .bind(expires)
    .bind(user.id)
    .execute(&pool)
    .await?;

    if let Err(e) = mail::send_password_reset(&user.email, &user.username, &token).await {
        tracing::error!(user_id = user.id, "failed to send reset email: {}", e);
        return Err(ApiError::bad_request("Failed to send reset email"));
    }

    Ok(Json(json!({ "message": RESET_SENT_MESSAGE })))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.password != payload.confirm_password {
        return Err(ApiError::bad_request("Passwords do not match"));
    }
    validate_password_strength(&payload.password).map_err(ApiError::bad_request)?;

    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE reset_password_token = $1 \
         AND reset_password_expires_at > now()",
    )
    .bind(&payload.token)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| ApiError::bad_request("Invalid or expired reset token"))?;

    let hashed = hash_password(&payload.password)?;

    sqlx::query(
        "UPDATE users SET password = $1, reset_password_token = NULL, \
         reset_password_expires_at = NULL, token_version = token_version + 1 \
         WHERE id = $2",
    )
    .bind(&hashed)
    .bind(user.id)
    .execute(&pool)
    .await?;

    tracing::info!(user_id = user.id, "password reset completed");
    Ok(Json(json!({ "message": "Password has been reset" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_64_hex_chars() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn reset_tokens_are_unique() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }
}
