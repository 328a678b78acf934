use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::QueryBuilder;

use crate::database::manager::DatabaseManager;
use crate::database::models::dish::{DishSummary, DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM};
use crate::database::models::{DishWithRefs, ViewHistory};
use crate::error::ApiError;
use crate::handlers::dishes::ensure_approved;
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct SaveViewRequest {
    pub dish_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ViewHistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub dish_id: i64,
    pub dish: DishSummary,
    pub viewed_at: DateTime<Utc>,
}

/// POST /api/view-history: record a view, bump the dish view counter, and
/// return the created entry with the dish resolved
pub async fn save_view(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<SaveViewRequest>,
) -> Result<Json<ViewHistoryEntry>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let dish: Option<(String,)> = sqlx::query_as("SELECT status FROM dishes WHERE id = $1")
        .bind(payload.dish_id)
        .fetch_optional(&pool)
        .await?;
    ensure_approved(dish.as_ref().map(|(s,)| s.as_str()))?;

    let entry = sqlx::query_as::<_, ViewHistory>(
        "INSERT INTO view_history (user_id, dish_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(auth_user.id)
    .bind(payload.dish_id)
    .fetch_one(&pool)
    .await?;

    sqlx::query("UPDATE dishes SET view_count = view_count + 1 WHERE id = $1")
        .bind(payload.dish_id)
        .execute(&pool)
        .await?;

    let mut query = QueryBuilder::new(format!(
        "SELECT {} {} WHERE d.id = ",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    query.push_bind(payload.dish_id);
    let dish: DishWithRefs = query.build_query_as().fetch_one(&pool).await?;

    Ok(Json(ViewHistoryEntry {
        id: entry.id,
        user_id: entry.user_id,
        dish_id: entry.dish_id,
        dish: dish.to_summary(),
        viewed_at: entry.viewed_at,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecentView {
    pub dish: DishSummary,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RecentViewsResponse {
    pub items: Vec<RecentView>,
    pub total_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ViewedDishRow {
    #[sqlx(flatten)]
    dish: DishWithRefs,
    viewed_at: DateTime<Utc>,
}

/// GET /api/view-history/:user_id/recent: public, latest views first
pub async fn recent_views(
    Path(user_id): Path<i64>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentViewsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let pool = DatabaseManager::pool().await?;

    let user: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?;
    if user.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let mut sql = QueryBuilder::new(format!(
        "SELECT {}, v.viewed_at {} \
         JOIN view_history v ON v.dish_id = d.id WHERE v.user_id = ",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    sql.push_bind(user_id);
    sql.push(" ORDER BY v.viewed_at DESC LIMIT ");
    sql.push_bind(limit);

    let rows: Vec<ViewedDishRow> = sql.build_query_as().fetch_all(&pool).await?;
    let items: Vec<RecentView> = rows
        .iter()
        .map(|row| RecentView {
            dish: row.dish.to_summary(),
            viewed_at: row.viewed_at,
        })
        .collect();

    let (total_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM view_history WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(RecentViewsResponse { items, total_count }))
}

/// DELETE /api/view-history: clear the caller's history
pub async fn clear_history(
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let result = sqlx::query("DELETE FROM view_history WHERE user_id = $1")
        .bind(auth_user.id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({
        "message": "View history cleared",
        "deleted_count": result.rows_affected()
    })))
}
