mod create;
mod detail;
mod list;
mod submissions;

pub use create::create_dish;
pub use detail::get_dish;
pub use list::list_dishes;
pub use submissions::{all_submissions, delete_dish, my_submissions, update_dish};

use sqlx::PgPool;

use crate::database::models::DishStatus;
use crate::error::ApiError;

/// Guard for the public surfaces that take a dish id (favorites, view
/// history): only approved dishes are accepted, anything else reads as absent
pub fn ensure_approved(status: Option<&str>) -> Result<(), ApiError> {
    match status {
        Some(s) if s == DishStatus::Approved.as_str() => Ok(()),
        _ => Err(ApiError::not_found("Dish not found or not approved")),
    }
}

/// Taste levels use a 0-5 scale
pub fn validate_taste_level(field: &str, level: Option<i32>) -> Result<(), ApiError> {
    if let Some(v) = level {
        if !(0..=5).contains(&v) {
            return Err(ApiError::bad_request(format!(
                "{} must be between 0 and 5",
                field
            )));
        }
    }
    Ok(())
}

pub async fn ensure_category_exists(pool: &PgPool, id: i64) -> Result<(), ApiError> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if found.is_none() {
        return Err(ApiError::bad_request("Invalid category"));
    }
    Ok(())
}

pub async fn ensure_region_exists(pool: &PgPool, id: i64) -> Result<(), ApiError> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM regions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if found.is_none() {
        return Err(ApiError::bad_request("Invalid region"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_approved_dishes_pass_the_public_guard() {
        assert!(ensure_approved(Some("approved")).is_ok());
        assert!(ensure_approved(Some("pending")).is_err());
        assert!(ensure_approved(Some("rejected")).is_err());
        assert!(ensure_approved(None).is_err());
    }

    #[test]
    fn taste_levels_bounded_to_five() {
        assert!(validate_taste_level("spiciness_level", None).is_ok());
        assert!(validate_taste_level("spiciness_level", Some(0)).is_ok());
        assert!(validate_taste_level("spiciness_level", Some(5)).is_ok());
        assert!(validate_taste_level("spiciness_level", Some(6)).is_err());
        assert!(validate_taste_level("spiciness_level", Some(-1)).is_err());
    }
}
