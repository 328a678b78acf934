use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::manager::DatabaseManager;
use crate::database::models::DishStatus;
use crate::error::ApiError;
use crate::middleware::AuthUser;

use super::{ensure_category_exists, ensure_region_exists, validate_taste_level};

#[derive(Debug, Deserialize)]
pub struct CreateDishRequest {
    pub name_japanese: String,
    pub name_vietnamese: String,
    pub name_romaji: Option<String>,
    pub description_japanese: Option<String>,
    pub description_vietnamese: Option<String>,
    pub description_romaji: Option<String>,
    pub category_id: Option<i64>,
    pub region_id: Option<i64>,
    pub spiciness_level: Option<i32>,
    pub saltiness_level: Option<i32>,
    pub sweetness_level: Option<i32>,
    pub sourness_level: Option<i32>,
    pub ingredients: Option<String>,
    pub how_to_eat: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CreatedDish {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub image_url: Option<String>,
}

/// POST /api/dishes: submit a dish for review; it enters the catalog as
/// `pending` and stays invisible to the public surfaces until approved.
pub async fn create_dish(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateDishRequest>,
) -> Result<Json<CreatedDish>, ApiError> {
    if payload.name_japanese.trim().is_empty() || payload.name_vietnamese.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Both Japanese and Vietnamese names are required",
        ));
    }

    validate_taste_level("spiciness_level", payload.spiciness_level)?;
    validate_taste_level("saltiness_level", payload.saltiness_level)?;
    validate_taste_level("sweetness_level", payload.sweetness_level)?;
    validate_taste_level("sourness_level", payload.sourness_level)?;

    let pool = DatabaseManager::pool().await?;

    if let Some(category_id) = payload.category_id {
        ensure_category_exists(&pool, category_id).await?;
    }
    if let Some(region_id) = payload.region_id {
        ensure_region_exists(&pool, region_id).await?;
    }

    let dish = sqlx::query_as::<_, CreatedDish>(
        "INSERT INTO dishes (\
            name_japanese, name_vietnamese, name_romaji, \
            description_japanese, description_vietnamese, description_romaji, \
            category_id, region_id, \
            spiciness_level, saltiness_level, sweetness_level, sourness_level, \
            ingredients, how_to_eat, image_url, status, submitted_by\
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
         RETURNING id, name_japanese, name_vietnamese, status, submitted_at, image_url",
    )
    .bind(payload.name_japanese.trim())
    .bind(payload.name_vietnamese.trim())
    .bind(&payload.name_romaji)
    .bind(&payload.description_japanese)
    .bind(&payload.description_vietnamese)
    .bind(&payload.description_romaji)
    .bind(payload.category_id)
    .bind(payload.region_id)
    .bind(payload.spiciness_level)
    .bind(payload.saltiness_level)
    .bind(payload.sweetness_level)
    .bind(payload.sourness_level)
    .bind(&payload.ingredients)
    .bind(&payload.how_to_eat)
    .bind(&payload.image_url)
    .bind(DishStatus::Pending.as_str())
    .bind(auth_user.id)
    .fetch_one(&pool)
    .await?;

    tracing::info!(dish_id = dish.id, user_id = auth_user.id, "dish submitted");
    Ok(Json(dish))
}
