use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Region {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    pub code: String,
}

/// Category shape embedded in dish responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Region shape embedded in dish responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRef {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
