use axum::{extract::Multipart, Extension, Json};
use serde_json::{json, Value};

use crate::config;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::storage;

/// Map an accepted image content type to its file extension
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// POST /api/upload/dish-image: multipart upload of a dish photo.
/// Accepts JPEG, PNG, or WebP up to the configured size limit.
pub async fn upload_dish_image(
    Extension(auth_user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let max_bytes = config::config().api.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid multipart payload"))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("Missing image content type"))?;
        let extension = extension_for(&content_type).ok_or_else(|| {
            ApiError::bad_request("Only JPEG, PNG, and WebP images are accepted")
        })?;

        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::bad_request("Failed to read image data"))?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("Image file is empty"));
        }
        if bytes.len() > max_bytes {
            return Err(ApiError::bad_request("Image must be 5MB or smaller"));
        }

        let key = storage::dish_image_key(extension);
        let url = storage::upload_dish_image(&key, bytes.to_vec(), &content_type)
            .await
            .map_err(|e| {
                tracing::warn!(user_id = auth_user.id, error = %e, "image upload failed");
                ApiError::bad_gateway("Failed to upload image")
            })?;

        tracing::info!(user_id = auth_user.id, key = %key, "dish image uploaded");
        return Ok(Json(json!({ "url": url, "message": "Image uploaded" })));
    }

    Err(ApiError::bad_request("Missing image field"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_expected_image_types() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("application/pdf"), None);
    }
}
