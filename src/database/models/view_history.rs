use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Append-only log of dish detail views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ViewHistory {
    pub id: i64,
    pub user_id: i64,
    pub dish_id: i64,
    pub viewed_at: DateTime<Utc>,
}
