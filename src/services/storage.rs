use aws_sdk_s3::{primitives::ByteStream, types::ObjectCannedAcl, Client};
use rand::Rng;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object storage is not configured")]
    NotConfigured,

    #[error("Upload failed: {0}")]
    Upload(String),
}

static CLIENT: OnceCell<Client> = OnceCell::const_new();

async fn client() -> &'static Client {
    CLIENT
        .get_or_init(|| async {
            let storage = &config::config().storage;
            let base = aws_config::from_env()
                .region(aws_config::Region::new(storage.region.clone()))
                .load()
                .await;

            let mut builder = aws_sdk_s3::config::Builder::from(&base)
                // S3-compatible stores (MinIO etc.) need path-style addressing
                .force_path_style(true);
            if let Some(endpoint) = &storage.endpoint {
                builder = builder.endpoint_url(endpoint.clone());
            }
            Client::from_conf(builder.build())
        })
        .await
}

/// Build a unique object key for a dish image
pub fn dish_image_key(extension: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let random: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(12)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("dishes/dish_{}_{}.{}", timestamp, random, extension)
}

/// Upload a dish image and return its public URL
pub async fn upload_dish_image(
    key: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String, StorageError> {
    let storage = &config::config().storage;
    let bucket = storage.bucket.as_deref().ok_or(StorageError::NotConfigured)?;
    let endpoint = storage.endpoint.as_deref().ok_or(StorageError::NotConfigured)?;

    client()
        .await
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type(content_type)
        .acl(ObjectCannedAcl::PublicRead)
        .send()
        .await
        .map_err(|e| StorageError::Upload(e.to_string()))?;

    Ok(format!(
        "{}/{}/{}",
        endpoint.trim_end_matches('/'),
        bucket,
        key
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dish_image_keys_are_unique_and_prefixed() {
        let a = dish_image_key("png");
        let b = dish_image_key("png");
        assert!(a.starts_with("dishes/dish_"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }
}
