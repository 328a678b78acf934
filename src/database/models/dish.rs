use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::catalog::{CategoryRef, RegionRef};

/// Dish lifecycle: pending -> approved | rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishStatus {
    Pending,
    Approved,
    Rejected,
}

impl DishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DishStatus::Pending => "pending",
            DishStatus::Approved => "approved",
            DishStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for DishStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DishStatus::Pending),
            "approved" => Ok(DishStatus::Approved),
            "rejected" => Ok(DishStatus::Rejected),
            other => Err(format!("unknown dish status: {}", other)),
        }
    }
}

impl std::fmt::Display for DishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dish {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    pub name_romaji: Option<String>,
    pub description_japanese: Option<String>,
    pub description_vietnamese: Option<String>,
    pub description_romaji: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub region_id: Option<i64>,
    pub spiciness_level: Option<i32>,
    pub saltiness_level: Option<i32>,
    pub sweetness_level: Option<i32>,
    pub sourness_level: Option<i32>,
    pub ingredients: Option<String>,
    pub how_to_eat: Option<String>,
    pub status: String,
    pub submitted_by: i64,
    pub reviewed_by: Option<i64>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub view_count: i64,
    pub updated_at: DateTime<Utc>,
}

impl Dish {
    pub fn is_approved(&self) -> bool {
        self.status == DishStatus::Approved.as_str()
    }

    pub fn is_pending(&self) -> bool {
        self.status == DishStatus::Pending.as_str()
    }
}

/// Column list for dish queries joined against categories, regions, and the
/// submitting user. Matches the fields of [`DishWithRefs`].
pub const DISH_WITH_REFS_COLUMNS: &str = "\
    d.id, d.name_japanese, d.name_vietnamese, d.name_romaji, \
    d.description_japanese, d.description_vietnamese, d.description_romaji, \
    d.image_url, d.category_id, d.region_id, \
    d.spiciness_level, d.saltiness_level, d.sweetness_level, d.sourness_level, \
    d.ingredients, d.how_to_eat, d.status, d.submitted_by, d.reviewed_by, \
    d.submitted_at, d.reviewed_at, d.rejection_reason, d.view_count, d.updated_at, \
    c.name_japanese AS category_name_japanese, \
    c.name_vietnamese AS category_name_vietnamese, \
    c.slug AS category_slug, \
    r.name_japanese AS region_name_japanese, \
    r.name_vietnamese AS region_name_vietnamese, \
    r.code AS region_code, \
    u.username AS submitter_username, \
    u.email AS submitter_email";

/// FROM clause that pairs with [`DISH_WITH_REFS_COLUMNS`]
pub const DISH_WITH_REFS_FROM: &str = "\
    FROM dishes d \
    LEFT JOIN categories c ON c.id = d.category_id \
    LEFT JOIN regions r ON r.id = d.region_id \
    JOIN users u ON u.id = d.submitted_by";

/// A dish row with its category/region names and submitter resolved
#[derive(Debug, Clone, FromRow)]
pub struct DishWithRefs {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    pub name_romaji: Option<String>,
    pub description_japanese: Option<String>,
    pub description_vietnamese: Option<String>,
    pub description_romaji: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub region_id: Option<i64>,
    pub spiciness_level: Option<i32>,
    pub saltiness_level: Option<i32>,
    pub sweetness_level: Option<i32>,
    pub sourness_level: Option<i32>,
    pub ingredients: Option<String>,
    pub how_to_eat: Option<String>,
    pub status: String,
    pub submitted_by: i64,
    pub reviewed_by: Option<i64>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub view_count: i64,
    pub updated_at: DateTime<Utc>,
    pub category_name_japanese: Option<String>,
    pub category_name_vietnamese: Option<String>,
    pub category_slug: Option<String>,
    pub region_name_japanese: Option<String>,
    pub region_name_vietnamese: Option<String>,
    pub region_code: Option<String>,
    pub submitter_username: String,
    pub submitter_email: String,
}

impl DishWithRefs {
    pub fn category_ref(&self) -> Option<CategoryRef> {
        match (&self.category_id, &self.category_name_japanese, &self.category_name_vietnamese) {
            (Some(id), Some(ja), Some(vi)) => Some(CategoryRef {
                id: *id,
                name_japanese: ja.clone(),
                name_vietnamese: vi.clone(),
                slug: None,
            }),
            _ => None,
        }
    }

    pub fn category_ref_with_slug(&self) -> Option<CategoryRef> {
        self.category_ref().map(|mut c| {
            c.slug = self.category_slug.clone();
            c
        })
    }

    pub fn region_ref(&self) -> Option<RegionRef> {
        match (&self.region_id, &self.region_name_japanese, &self.region_name_vietnamese) {
            (Some(id), Some(ja), Some(vi)) => Some(RegionRef {
                id: *id,
                name_japanese: ja.clone(),
                name_vietnamese: vi.clone(),
                code: None,
            }),
            _ => None,
        }
    }

    pub fn region_ref_with_code(&self) -> Option<RegionRef> {
        self.region_ref().map(|mut r| {
            r.code = self.region_code.clone();
            r
        })
    }

    /// Public catalog shape: what browse/detail/favorites return
    pub fn to_public(&self) -> DishResponse {
        DishResponse {
            id: self.id,
            name_japanese: self.name_japanese.clone(),
            name_vietnamese: self.name_vietnamese.clone(),
            name_romaji: self.name_romaji.clone(),
            description_japanese: self.description_japanese.clone(),
            description_vietnamese: self.description_vietnamese.clone(),
            description_romaji: self.description_romaji.clone(),
            image_url: self.image_url.clone(),
            submitter: SubmitterRef {
                id: None,
                username: self.submitter_username.clone(),
                email: None,
            },
            category: self.category_ref(),
            region: self.region_ref(),
            spiciness_level: self.spiciness_level,
            saltiness_level: self.saltiness_level,
            sweetness_level: self.sweetness_level,
            sourness_level: self.sourness_level,
            ingredients: self.ingredients.clone().unwrap_or_default(),
            how_to_eat: self.how_to_eat.clone().unwrap_or_default(),
            view_count: self.view_count,
            submitted_at: Some(self.submitted_at),
            reviewed_at: self.reviewed_at,
        }
    }

    /// Review shape: adds lifecycle fields and full submitter info
    pub fn to_submission(&self) -> SubmissionResponse {
        SubmissionResponse {
            id: self.id,
            name_japanese: self.name_japanese.clone(),
            name_vietnamese: self.name_vietnamese.clone(),
            name_romaji: self.name_romaji.clone(),
            description_japanese: self.description_japanese.clone(),
            description_vietnamese: self.description_vietnamese.clone(),
            description_romaji: self.description_romaji.clone(),
            image_url: self.image_url.clone(),
            category_id: self.category_id,
            region_id: self.region_id,
            category: self.category_ref(),
            region: self.region_ref(),
            spiciness_level: self.spiciness_level,
            saltiness_level: self.saltiness_level,
            sweetness_level: self.sweetness_level,
            sourness_level: self.sourness_level,
            ingredients: self.ingredients.clone(),
            how_to_eat: self.how_to_eat.clone(),
            status: self.status.clone(),
            submitter: SubmitterRef {
                id: Some(self.submitted_by),
                username: self.submitter_username.clone(),
                email: Some(self.submitter_email.clone()),
            },
            reviewed_by: self.reviewed_by,
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
            rejection_reason: self.rejection_reason.clone(),
        }
    }

    /// Compact shape embedded in view-history, profile, and template responses
    pub fn to_summary(&self) -> DishSummary {
        DishSummary {
            id: self.id,
            name_japanese: self.name_japanese.clone(),
            name_vietnamese: self.name_vietnamese.clone(),
            name_romaji: self.name_romaji.clone(),
            description_japanese: self.description_japanese.clone(),
            description_vietnamese: self.description_vietnamese.clone(),
            description_romaji: self.description_romaji.clone(),
            image_url: self.image_url.clone(),
            view_count: self.view_count,
            category: self.category_ref_with_slug(),
            region: self.region_ref_with_code(),
        }
    }
}

/// Submitting user embedded in dish responses; public surfaces only carry the username
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitterRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishResponse {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_romaji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_japanese: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_vietnamese: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_romaji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub submitter: SubmitterRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spiciness_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saltiness_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweetness_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourness_level: Option<i32>,
    pub ingredients: String,
    pub how_to_eat: String,
    pub view_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    pub name_romaji: Option<String>,
    pub description_japanese: Option<String>,
    pub description_vietnamese: Option<String>,
    pub description_romaji: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub region_id: Option<i64>,
    pub category: Option<CategoryRef>,
    pub region: Option<RegionRef>,
    pub spiciness_level: Option<i32>,
    pub saltiness_level: Option<i32>,
    pub sweetness_level: Option<i32>,
    pub sourness_level: Option<i32>,
    pub ingredients: Option<String>,
    pub how_to_eat: Option<String>,
    pub status: String,
    pub submitter: SubmitterRef,
    pub reviewed_by: Option<i64>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishSummary {
    pub id: i64,
    pub name_japanese: String,
    pub name_vietnamese: String,
    pub name_romaji: Option<String>,
    pub description_japanese: Option<String>,
    pub description_vietnamese: Option<String>,
    pub description_romaji: Option<String>,
    pub image_url: Option<String>,
    pub view_count: i64,
    pub category: Option<CategoryRef>,
    pub region: Option<RegionRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_statuses() {
        assert_eq!(DishStatus::from_str("pending").unwrap(), DishStatus::Pending);
        assert_eq!(DishStatus::from_str("approved").unwrap(), DishStatus::Approved);
        assert_eq!(DishStatus::from_str("rejected").unwrap(), DishStatus::Rejected);
        assert!(DishStatus::from_str("draft").is_err());
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in [DishStatus::Pending, DishStatus::Approved, DishStatus::Rejected] {
            assert_eq!(DishStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }
}
