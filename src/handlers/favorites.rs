use axum::{extract::Path, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::QueryBuilder;

use crate::database::manager::DatabaseManager;
use crate::database::models::dish::{
    DishResponse, DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM,
};
use crate::database::models::DishWithRefs;
use crate::error::ApiError;
use crate::handlers::dishes::ensure_approved;
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub dish_id: i64,
}

#[derive(Debug, Serialize)]
pub struct FavoriteEntry {
    #[serde(flatten)]
    pub dish: DishResponse,
    pub favorited_at: DateTime<Utc>,
}

/// Row shape for the favorites listing: dish refs plus when it was favorited
#[derive(Debug, sqlx::FromRow)]
struct FavoritedDishRow {
    #[sqlx(flatten)]
    dish: DishWithRefs,
    favorited_at: DateTime<Utc>,
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// POST /api/favorites: favorite an approved dish
pub async fn add_favorite(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<FavoriteRequest>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let dish: Option<(String,)> = sqlx::query_as("SELECT status FROM dishes WHERE id = $1")
        .bind(payload.dish_id)
        .fetch_optional(&pool)
        .await?;
    ensure_approved(dish.as_ref().map(|(s,)| s.as_str()))?;

    let inserted = sqlx::query("INSERT INTO favorites (user_id, dish_id) VALUES ($1, $2)")
        .bind(auth_user.id)
        .bind(payload.dish_id)
        .execute(&pool)
        .await;

    match inserted {
        Ok(_) => Ok(Json(json!({ "message": "Dish added to favorites" }))),
        Err(err) if is_unique_violation(&err) => {
            Err(ApiError::bad_request("Dish is already favorited"))
        }
        Err(err) => Err(err.into()),
    }
}

/// DELETE /api/favorites/:dish_id: remove a favorite
pub async fn remove_favorite(
    Extension(auth_user): Extension<AuthUser>,
    Path(dish_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND dish_id = $2")
        .bind(auth_user.id)
        .bind(dish_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Favorite not found"));
    }
    Ok(Json(json!({ "message": "Dish removed from favorites" })))
}

/// GET /api/favorites: the caller's favorites, newest first
pub async fn list_favorites(
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<FavoriteEntry>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut query = QueryBuilder::new(format!(
        "SELECT {}, f.created_at AS favorited_at {} \
         JOIN favorites f ON f.dish_id = d.id WHERE f.user_id = ",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    query.push_bind(auth_user.id);
    query.push(" ORDER BY f.created_at DESC");

    let rows: Vec<FavoritedDishRow> = query.build_query_as().fetch_all(&pool).await?;
    let entries = rows
        .iter()
        .map(|row| FavoriteEntry {
            dish: row.dish.to_public(),
            favorited_at: row.favorited_at,
        })
        .collect();
    Ok(Json(entries))
}

/// GET /api/favorites/check/:dish_id
pub async fn check_favorite(
    Extension(auth_user): Extension<AuthUser>,
    Path(dish_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let found: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM favorites WHERE user_id = $1 AND dish_id = $2")
            .bind(auth_user.id)
            .bind(dish_id)
            .fetch_optional(&pool)
            .await?;

    Ok(Json(json!({ "is_favorite": found.is_some() })))
}

#[derive(Debug, Serialize)]
pub struct RegionPopularity {
    pub region: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct FavoriteStatistics {
    pub total: i64,
    pub spicy_count: i64,
    pub region_popularity: Vec<RegionPopularity>,
}

/// GET /api/favorites/statistics: taste profile over the caller's favorites
pub async fn favorite_statistics(
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<FavoriteStatistics>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let (total, spicy_count): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE d.spiciness_level > 0) \
         FROM favorites f JOIN dishes d ON d.id = f.dish_id \
         WHERE f.user_id = $1",
    )
    .bind(auth_user.id)
    .fetch_one(&pool)
    .await?;

    let regions: Vec<(String, i64)> = sqlx::query_as(
        "SELECT COALESCE(r.name_vietnamese, 'unknown') AS region, COUNT(*) \
         FROM favorites f \
         JOIN dishes d ON d.id = f.dish_id \
         LEFT JOIN regions r ON r.id = d.region_id \
         WHERE f.user_id = $1 \
         GROUP BY COALESCE(r.name_vietnamese, 'unknown') \
         ORDER BY COUNT(*) DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&pool)
    .await?;

    let region_popularity = regions
        .into_iter()
        .map(|(region, count)| RegionPopularity { region, count })
        .collect();

    Ok(Json(FavoriteStatistics {
        total,
        spicy_count,
        region_popularity,
    }))
}
