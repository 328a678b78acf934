use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// POST /api/auth/logout
///
/// Invalidate the caller's outstanding tokens by bumping token_version, as a
/// compare-and-increment on the version the presented token carries. A second
/// logout with the same token is reported as already logged out rather than
/// bumping again.
pub async fn logout(Extension(auth_user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let updated = sqlx::query(
        "UPDATE users SET token_version = $1 WHERE id = $2 AND token_version = $3",
    )
    .bind(auth_user.token_version + 1)
    .bind(auth_user.id)
    .bind(auth_user.token_version)
    .execute(&pool)
    .await?;

    if updated.rows_affected() == 0 {
        let stored: Option<(i32,)> =
            sqlx::query_as("SELECT token_version FROM users WHERE id = $1")
                .bind(auth_user.id)
                .fetch_optional(&pool)
                .await?;

        let stored = match stored {
            Some((tv,)) => tv,
            None => return Err(ApiError::not_found("User not found")),
        };

        if stored > auth_user.token_version {
            return Ok(Json(json!({ "message": "Already logged out" })));
        }

        // Lost a race with a concurrent writer; try once more
        let retry = sqlx::query(
            "UPDATE users SET token_version = $1 WHERE id = $2 AND token_version = $3",
        )
        .bind(auth_user.token_version + 1)
        .bind(auth_user.id)
        .bind(auth_user.token_version)
        .execute(&pool)
        .await?;

        if retry.rows_affected() == 0 {
            return Ok(Json(json!({ "message": "Already logged out" })));
        }
    }

    tracing::info!(user_id = auth_user.id, "user logged out");
    Ok(Json(json!({ "message": "Logged out" })))
}
