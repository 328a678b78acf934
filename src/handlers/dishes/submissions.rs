use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::manager::DatabaseManager;
use crate::database::models::dish::{
    SubmissionResponse, DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM,
};
use crate::database::models::{Dish, DishStatus, DishWithRefs};
use crate::error::ApiError;
use crate::middleware::AuthUser;

use super::{ensure_category_exists, ensure_region_exists, validate_taste_level};

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionsQuery {
    pub status: Option<String>,
}

async fn fetch_submission(pool: &PgPool, id: i64) -> Result<DishWithRefs, ApiError> {
    let mut query = QueryBuilder::new(format!(
        "SELECT {} {} WHERE d.id = ",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    query.push_bind(id);

    let dish: Option<DishWithRefs> = query.build_query_as().fetch_optional(pool).await?;
    dish.ok_or_else(|| ApiError::not_found("Dish not found"))
}

/// GET /api/dishes/submissions: admin review queue, optionally filtered by status
pub async fn all_submissions(
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SubmissionsQuery>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    auth_user.require_admin()?;

    let status = match query.status.as_deref() {
        Some(raw) => Some(
            raw.parse::<DishStatus>()
                .map_err(|_| ApiError::bad_request("Invalid status filter"))?,
        ),
        None => None,
    };

    let pool = DatabaseManager::pool().await?;

    let mut list_query: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
        "SELECT {} {}",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    if let Some(status) = status {
        list_query.push(" WHERE d.status = ");
        list_query.push_bind(status.as_str());
    }
    list_query.push(" ORDER BY d.submitted_at DESC");

    let rows: Vec<DishWithRefs> = list_query.build_query_as().fetch_all(&pool).await?;
    Ok(Json(rows.iter().map(|d| d.to_submission()).collect()))
}

/// GET /api/dishes/submissions/mine: the caller's own submissions
pub async fn my_submissions(
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut query = QueryBuilder::new(format!(
        "SELECT {} {} WHERE d.submitted_by = ",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    query.push_bind(auth_user.id);
    query.push(" ORDER BY d.submitted_at DESC");

    let rows: Vec<DishWithRefs> = query.build_query_as().fetch_all(&pool).await?;
    Ok(Json(rows.iter().map(|d| d.to_submission()).collect()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDishRequest {
    pub name_japanese: Option<String>,
    pub name_vietnamese: Option<String>,
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
    pub status: Option<String>,
    pub rejection_reason: Option<String>,
}

/// Who may edit what: admins may edit any dish, owners only their own while
/// it is still pending, and only admins may touch the status.
fn authorize_update(
    is_admin: bool,
    caller_id: i64,
    submitted_by: i64,
    status: &str,
    changes_status: bool,
) -> Result<(), ApiError> {
    if is_admin {
        return Ok(());
    }
    if submitted_by != caller_id {
        return Err(ApiError::forbidden("You can only edit your own dishes"));
    }
    if status != DishStatus::Pending.as_str() {
        return Err(ApiError::forbidden("Only pending submissions can be edited"));
    }
    if changes_status {
        return Err(ApiError::forbidden("Only admins can change dish status"));
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
struct ReviewFields {
    reviewed_by: Option<i64>,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
}

/// A status change records the review. Rejecting requires a non-blank reason;
/// any other transition clears a previously stored one.
fn review_fields(
    status: DishStatus,
    rejection_reason: Option<&str>,
    reviewer: i64,
    now: DateTime<Utc>,
) -> Result<ReviewFields, ApiError> {
    let reason = rejection_reason.map(str::trim).filter(|r| !r.is_empty());

    let rejection_reason = if status == DishStatus::Rejected {
        match reason {
            Some(reason) => Some(reason.to_string()),
            None => {
                return Err(ApiError::bad_request(
                    "A rejection reason is required when rejecting a dish",
                ))
            }
        }
    } else {
        None
    };

    Ok(ReviewFields {
        reviewed_by: Some(reviewer),
        reviewed_at: Some(now),
        rejection_reason,
    })
}

/// PATCH /api/dishes/:id: edit a submission. See [`authorize_update`] and
/// [`review_fields`] for the ownership and review rules.
pub async fn update_dish(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDishRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existing: Option<Dish> = sqlx::query_as("SELECT * FROM dishes WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    let existing = existing.ok_or_else(|| ApiError::not_found("Dish not found"))?;

    authorize_update(
        auth_user.is_admin(),
        auth_user.id,
        existing.submitted_by,
        &existing.status,
        payload.status.is_some(),
    )?;

    validate_taste_level("spiciness_level", payload.spiciness_level)?;
    validate_taste_level("saltiness_level", payload.saltiness_level)?;
    validate_taste_level("sweetness_level", payload.sweetness_level)?;
    validate_taste_level("sourness_level", payload.sourness_level)?;

    if let Some(category_id) = payload.category_id {
        ensure_category_exists(&pool, category_id).await?;
    }
    if let Some(region_id) = payload.region_id {
        ensure_region_exists(&pool, region_id).await?;
    }

    // Status change is a review action
    let new_status = match &payload.status {
        Some(raw) => {
            let status = raw
                .parse::<DishStatus>()
                .map_err(|_| ApiError::bad_request("Invalid status"))?;
            if status.as_str() != existing.status {
                Some(status)
            } else {
                None
            }
        }
        None => None,
    };

    let review = match new_status {
        Some(status) => review_fields(
            status,
            payload.rejection_reason.as_deref(),
            auth_user.id,
            Utc::now(),
        )?,
        None => ReviewFields {
            reviewed_by: existing.reviewed_by,
            reviewed_at: existing.reviewed_at,
            rejection_reason: existing.rejection_reason.clone(),
        },
    };

    let status_str = new_status
        .map(|s| s.as_str().to_string())
        .unwrap_or(existing.status);

    sqlx::query(
        "UPDATE dishes SET \
            name_japanese = $1, name_vietnamese = $2, name_romaji = $3, \
            description_japanese = $4, description_vietnamese = $5, description_romaji = $6, \
            category_id = $7, region_id = $8, \
            spiciness_level = $9, saltiness_level = $10, sweetness_level = $11, sourness_level = $12, \
            ingredients = $13, how_to_eat = $14, image_url = $15, \
            status = $16, reviewed_by = $17, reviewed_at = $18, rejection_reason = $19, \
            updated_at = now() \
         WHERE id = $20",
    )
    .bind(payload.name_japanese.unwrap_or(existing.name_japanese))
    .bind(payload.name_vietnamese.unwrap_or(existing.name_vietnamese))
    .bind(payload.name_romaji.or(existing.name_romaji))
    .bind(payload.description_japanese.or(existing.description_japanese))
    .bind(payload.description_vietnamese.or(existing.description_vietnamese))
    .bind(payload.description_romaji.or(existing.description_romaji))
    .bind(payload.category_id.or(existing.category_id))
    .bind(payload.region_id.or(existing.region_id))
    .bind(payload.spiciness_level.or(existing.spiciness_level))
    .bind(payload.saltiness_level.or(existing.saltiness_level))
    .bind(payload.sweetness_level.or(existing.sweetness_level))
    .bind(payload.sourness_level.or(existing.sourness_level))
    .bind(payload.ingredients.or(existing.ingredients))
    .bind(payload.how_to_eat.or(existing.how_to_eat))
    .bind(payload.image_url.or(existing.image_url))
    .bind(&status_str)
    .bind(review.reviewed_by)
    .bind(review.reviewed_at)
    .bind(&review.rejection_reason)
    .bind(id)
    .execute(&pool)
    .await?;

    if new_status.is_some() {
        tracing::info!(dish_id = id, reviewer = auth_user.id, status = %status_str, "dish reviewed");
    }

    let updated = fetch_submission(&pool, id).await?;
    Ok(Json(updated.to_submission()))
}

/// DELETE /api/dishes/:id: submitters may withdraw their own dishes
pub async fn delete_dish(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT submitted_by FROM dishes WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    let (submitted_by,) = existing.ok_or_else(|| ApiError::not_found("Dish not found"))?;

    if submitted_by != auth_user.id && !auth_user.is_admin() {
        return Err(ApiError::forbidden("You can only delete your own dishes"));
    }

    sqlx::query("DELETE FROM dishes WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!(dish_id = id, user_id = auth_user.id, "dish deleted");
    Ok(Json(json!({ "message": "Dish deleted", "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: i64 = 7;
    const OTHER: i64 = 8;
    const ADMIN: i64 = 1;

    #[test]
    fn admins_may_edit_anything() {
        assert!(authorize_update(true, ADMIN, OWNER, "approved", true).is_ok());
        assert!(authorize_update(true, ADMIN, OWNER, "rejected", false).is_ok());
    }

    #[test]
    fn owners_may_edit_only_their_own_pending_dishes() {
        assert!(authorize_update(false, OWNER, OWNER, "pending", false).is_ok());
        assert!(authorize_update(false, OTHER, OWNER, "pending", false).is_err());
        assert!(authorize_update(false, OWNER, OWNER, "approved", false).is_err());
        assert!(authorize_update(false, OWNER, OWNER, "rejected", false).is_err());
    }

    #[test]
    fn only_admins_may_change_status() {
        let err = authorize_update(false, OWNER, OWNER, "pending", true).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), "Only admins can change dish status");
    }

    #[test]
    fn rejection_requires_a_reason() {
        let now = Utc::now();
        for reason in [None, Some(""), Some("   ")] {
            let err = review_fields(DishStatus::Rejected, reason, ADMIN, now).unwrap_err();
            assert_eq!(err.status_code(), 400);
        }
    }

    #[test]
    fn rejection_records_the_trimmed_reason() {
        let now = Utc::now();
        let review = review_fields(DishStatus::Rejected, Some("  blurry photo "), ADMIN, now)
            .expect("review");
        assert_eq!(review.reviewed_by, Some(ADMIN));
        assert_eq!(review.reviewed_at, Some(now));
        assert_eq!(review.rejection_reason.as_deref(), Some("blurry photo"));
    }

    #[test]
    fn approval_clears_any_stored_reason() {
        let now = Utc::now();
        let review = review_fields(DishStatus::Approved, Some("stale reason"), ADMIN, now)
            .expect("review");
        assert_eq!(review.reviewed_by, Some(ADMIN));
        assert!(review.rejection_reason.is_none());
    }
}
