use axum::{extract::Path, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::QueryBuilder;

use crate::database::manager::DatabaseManager;
use crate::database::models::dish::{DishSummary, DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM};
use crate::database::models::{DishWithRefs, SavedTemplate};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::ai::{self, AiError, GeneratedTexts};

#[derive(Debug, Deserialize)]
pub struct GenerateIntroductionRequest {
    pub dish_id: i64,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateIntroductionResponse {
    pub dish_id: i64,
    pub generated_text_ja: String,
    pub generated_text_vi: String,
}

/// A missing API key is a deployment problem the caller can be told about;
/// anything else is an upstream failure.
fn introduction_error(err: AiError) -> ApiError {
    match err {
        AiError::MissingApiKey => ApiError::bad_request(err.to_string()),
        AiError::Request(_) | AiError::EmptyResponse => {
            ApiError::bad_gateway("Failed to generate introduction")
        }
    }
}

/// POST /api/templates/generate-introduction: produce a bilingual
/// introduction for a dish via the chat-completions API
pub async fn generate_introduction(
    Extension(_auth_user): Extension<AuthUser>,
    Json(payload): Json<GenerateIntroductionRequest>,
) -> Result<Json<GenerateIntroductionResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut query = QueryBuilder::new(format!(
        "SELECT {} {} WHERE d.id = ",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    query.push_bind(payload.dish_id);

    let dish: Option<DishWithRefs> = query.build_query_as().fetch_optional(&pool).await?;
    let dish = dish.ok_or_else(|| ApiError::not_found("Dish not found"))?;

    let GeneratedTexts { ja, vi } = ai::generate_introduction(&dish, payload.context.trim())
        .await
        .map_err(|e| {
            tracing::warn!(dish_id = payload.dish_id, error = %e, "introduction generation failed");
            introduction_error(e)
        })?;

    Ok(Json(GenerateIntroductionResponse {
        dish_id: payload.dish_id,
        generated_text_ja: ja,
        generated_text_vi: vi,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub dish_id: i64,
    pub generated_text_ja: String,
    pub generated_text_vi: String,
    pub title: Option<String>,
    pub context: Option<String>,
    pub audio_url: Option<String>,
}

/// POST /api/templates/saved-templates
pub async fn save_template(
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<SaveTemplateRequest>,
) -> Result<Json<SavedTemplate>, ApiError> {
    if payload.generated_text_ja.trim().is_empty() || payload.generated_text_vi.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Both generated texts are required to save a template",
        ));
    }

    let pool = DatabaseManager::pool().await?;

    let dish: Option<(i64,)> = sqlx::query_as("SELECT id FROM dishes WHERE id = $1")
        .bind(payload.dish_id)
        .fetch_optional(&pool)
        .await?;
    if dish.is_none() {
        return Err(ApiError::not_found("Dish not found"));
    }

    let template = sqlx::query_as::<_, SavedTemplate>(
        "INSERT INTO saved_templates \
            (user_id, dish_id, generated_text_ja, generated_text_vi, title, context, audio_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(auth_user.id)
    .bind(payload.dish_id)
    .bind(payload.generated_text_ja.trim())
    .bind(payload.generated_text_vi.trim())
    .bind(&payload.title)
    .bind(&payload.context)
    .bind(&payload.audio_url)
    .fetch_one(&pool)
    .await?;

    Ok(Json(template))
}

#[derive(Debug, Serialize)]
pub struct SavedTemplateEntry {
    #[serde(flatten)]
    pub template: SavedTemplate,
    pub dish: Option<DishSummary>,
}

// Template columns are aliased to avoid clashing with the dish columns
#[derive(Debug, sqlx::FromRow)]
struct TemplateWithDishRow {
    template_id: i64,
    template_user_id: i64,
    template_dish_id: i64,
    generated_text_ja: String,
    generated_text_vi: String,
    title: Option<String>,
    context: Option<String>,
    audio_url: Option<String>,
    template_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    dish: DishWithRefs,
}

/// GET /api/templates/saved-templates: the caller's templates, newest first
pub async fn list_templates(
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<SavedTemplateEntry>>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let mut query = QueryBuilder::new(format!(
        "SELECT t.id AS template_id, t.user_id AS template_user_id, \
                t.dish_id AS template_dish_id, t.generated_text_ja, t.generated_text_vi, \
                t.title, t.context, t.audio_url, t.created_at AS template_created_at, {} {} \
         JOIN saved_templates t ON t.dish_id = d.id WHERE t.user_id = ",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    query.push_bind(auth_user.id);
    query.push(" ORDER BY t.created_at DESC");

    let rows: Vec<TemplateWithDishRow> = query.build_query_as().fetch_all(&pool).await?;
    let entries = rows
        .into_iter()
        .map(|row| {
            let dish = Some(row.dish.to_summary());
            SavedTemplateEntry {
                template: SavedTemplate {
                    id: row.template_id,
                    user_id: row.template_user_id,
                    dish_id: row.template_dish_id,
                    generated_text_ja: row.generated_text_ja,
                    generated_text_vi: row.generated_text_vi,
                    title: row.title,
                    context: row.context,
                    audio_url: row.audio_url,
                    created_at: row.template_created_at,
                },
                dish,
            }
        })
        .collect();
    Ok(Json(entries))
}

/// DELETE /api/templates/saved-templates/:id
pub async fn delete_template(
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let owner: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM saved_templates WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    let (user_id,) = owner.ok_or_else(|| ApiError::not_found("Template not found"))?;

    if user_id != auth_user.id {
        return Err(ApiError::bad_request(
            "You are not allowed to delete this template",
        ));
    }

    sqlx::query("DELETE FROM saved_templates WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "message": "Template deleted", "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_a_client_visible_misconfiguration() {
        let err = introduction_error(AiError::MissingApiKey);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "OPENAI_API_KEY is not set");
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let err = introduction_error(AiError::Request("timed out".into()));
        assert_eq!(err.status_code(), 502);

        let err = introduction_error(AiError::EmptyResponse);
        assert_eq!(err.status_code(), 502);
    }
}
