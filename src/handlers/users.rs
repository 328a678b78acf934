use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::database::manager::DatabaseManager;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::AuthUser;

#[derive(Debug, Serialize)]
pub struct UserStatistics {
    pub total_searches: i64,
    pub total_views: i64,
    pub total_favorites: i64,
    pub consecutive_login_days: i32,
    pub member_since: DateTime<Utc>,
}

/// GET /api/users/statistics
pub async fn statistics(
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserStatistics>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let (total_views,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM view_history WHERE user_id = $1")
            .bind(auth_user.id)
            .fetch_one(&pool)
            .await?;

    let (total_favorites,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
            .bind(auth_user.id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(UserStatistics {
        // Searches are not tracked separately; views stand in for them
        total_searches: total_views,
        total_views,
        total_favorites,
        consecutive_login_days: user.consecutive_login_days,
        member_since: user.registration_date,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(alias = "oldPassword")]
    pub old_password: String,
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
}

/// PATCH /api/users/change-password
pub async fn change_password(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if payload.password != payload.confirm_password {
        return Err(ApiError::bad_request("Passwords do not match"));
    }
    if payload.old_password == payload.password {
        return Err(ApiError::bad_request("New password must differ from the old one"));
    }
    validate_password_strength(&payload.password).map_err(ApiError::bad_request)?;

    if !verify_password(&payload.old_password, &user.password)? {
        return Err(ApiError::bad_request("Old password is incorrect"));
    }

    let hashed = hash_password(&payload.password)?;

    // Bump token_version so every outstanding token is revoked
    sqlx::query(
        "UPDATE users SET password = $1, token_version = token_version + 1 WHERE id = $2",
    )
    .bind(&hashed)
    .bind(auth_user.id)
    .execute(&pool)
    .await?;

    tracing::info!(user_id = auth_user.id, "password changed");
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
