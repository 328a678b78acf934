use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A saved AI-generated dish introduction
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedTemplate {
    pub id: i64,
    pub user_id: i64,
    pub dish_id: i64,
    pub generated_text_ja: String,
    pub generated_text_vi: String,
    pub title: Option<String>,
    pub context: Option<String>,
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
