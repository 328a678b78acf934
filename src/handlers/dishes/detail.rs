use axum::{extract::Path, Json};
use sqlx::QueryBuilder;

use crate::database::manager::DatabaseManager;
use crate::database::models::dish::{
    DishResponse, DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM,
};
use crate::database::models::{DishStatus, DishWithRefs};
use crate::error::ApiError;

/// GET /api/dishes/:id: public detail, approved dishes only
pub async fn get_dish(Path(id): Path<i64>) -> Result<Json<DishResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut query = QueryBuilder::new(format!(
        "SELECT {} {} WHERE d.id = ",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    query.push_bind(id);
    query.push(" AND d.status = ");
    query.push_bind(DishStatus::Approved.as_str());

    let dish: Option<DishWithRefs> = query.build_query_as().fetch_optional(&pool).await?;

    match dish {
        Some(dish) => Ok(Json(dish.to_public())),
        None => Err(ApiError::not_found("Dish not found")),
    }
}
