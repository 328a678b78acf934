use axum::{extract::Path, Extension, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::password::validate_email_format;
use crate::database::manager::DatabaseManager;
use crate::database::models::dish::{DishSummary, DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM};
use crate::database::models::{DishWithRefs, User};
use crate::error::ApiError;
use crate::middleware::AuthUser;

#[derive(Debug, Serialize)]
pub struct FavoritedDishes {
    pub dishes: Vec<DishSummary>,
    pub number_of_dishes: usize,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub birthday: Option<NaiveDate>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub registration_date: DateTime<Utc>,
    pub consecutive_login_days: i32,
    pub favorited_dishes: FavoritedDishes,
}

async fn load_profile(pool: &PgPool, user_id: i64) -> Result<ProfileResponse, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let sql = format!(
        "SELECT {} {} JOIN favorites f ON f.dish_id = d.id \
         WHERE f.user_id = $1 ORDER BY f.created_at DESC",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    );
    let favorites = sqlx::query_as::<_, DishWithRefs>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    let dishes: Vec<DishSummary> = favorites.iter().map(|d| d.to_summary()).collect();
    let number_of_dishes = dishes.len();

    Ok(ProfileResponse {
        id: user.id,
        email: user.email,
        username: user.username,
        birthday: user.birthday,
        location: user.location,
        avatar_url: user.avatar_url,
        registration_date: user.registration_date,
        consecutive_login_days: user.consecutive_login_days,
        favorited_dishes: FavoritedDishes {
            dishes,
            number_of_dishes,
        },
    })
}

/// GET /api/users/profile/:id
pub async fn get_profile(Path(id): Path<i64>) -> Result<Json<ProfileResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    Ok(Json(load_profile(&pool, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct EditProfileRequest {
    pub id: i64,
    pub email: Option<String>,
    pub location: Option<String>,
    /// ISO date; an empty string clears the stored birthday
    pub birthday: Option<String>,
    pub avatar_url: Option<String>,
}

/// POST /api/users/profile: owner only
pub async fn edit_profile(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<EditProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if payload.id != auth_user.id {
        return Err(ApiError::forbidden("You can only edit your own profile"));
    }

    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let email = match payload.email {
        Some(email) => {
            validate_email_format(&email).map_err(ApiError::bad_request)?;
            email
        }
        None => user.email,
    };

    let birthday = match payload.birthday.as_deref() {
        None => user.birthday,
        Some("") => None,
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ApiError::bad_request("Invalid birthday"))?,
        ),
    };

    let location = payload.location.or(user.location);
    let avatar_url = payload.avatar_url.or(user.avatar_url);

    sqlx::query(
        "UPDATE users SET email = $1, location = $2, birthday = $3, avatar_url = $4 \
         WHERE id = $5",
    )
    .bind(&email)
    .bind(&location)
    .bind(birthday)
    .bind(&avatar_url)
    .bind(auth_user.id)
    .execute(&pool)
    .await?;

    Ok(Json(load_profile(&pool, auth_user.id).await?))
}
