use axum::Json;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Category, Region};
use crate::error::ApiError;

/// GET /api/categories
pub async fn list_categories() -> Result<Json<Vec<Category>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY id ASC")
            .fetch_all(&pool)
            .await?;
    Ok(Json(categories))
}

/// GET /api/regions
pub async fn list_regions() -> Result<Json<Vec<Region>>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let regions = sqlx::query_as::<_, Region>("SELECT * FROM regions ORDER BY id ASC")
        .fetch_all(&pool)
        .await?;
    Ok(Json(regions))
}
