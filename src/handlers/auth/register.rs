use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::password::{hash_password, validate_email_format, validate_password_strength};
use crate::database::manager::DatabaseManager;
use crate::database::models::UserRole;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
    /// ISO date, e.g. "2001-04-30"
    pub birthday: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RegisteredUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: String,
    pub registration_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: RegisteredUser,
}

/// POST /api/auth/register
pub async fn register(
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    if payload.password != payload.confirm_password {
        return Err(ApiError::bad_request("Passwords do not match"));
    }

    validate_email_format(&payload.email).map_err(ApiError::bad_request)?;
    validate_password_strength(&payload.password).map_err(ApiError::bad_request)?;

    if payload.username.trim().is_empty() {
        return Err(ApiError::bad_request("Username is required"));
    }

    let birthday = match payload.birthday.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ApiError::bad_request("Invalid birthday"))?,
        ),
    };

    let pool = DatabaseManager::pool().await?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await?;
    if existing.is_some() {
        return Err(ApiError::bad_request("Email is already in use"));
    }

    let hashed = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, RegisteredUser>(
        "INSERT INTO users (email, username, password, role, birthday, location) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, email, username, role, registration_date",
    )
    .bind(&payload.email)
    .bind(payload.username.trim())
    .bind(&hashed)
    .bind(UserRole::User.as_str())
    .bind(birthday)
    .bind(&payload.location)
    .fetch_one(&pool)
    .await?;

    tracing::info!(user_id = user.id, "registered new user");

    Ok(Json(RegisterResponse {
        message: "Registration successful".to_string(),
        user,
    }))
}
