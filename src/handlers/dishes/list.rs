use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::dish::{
    DishResponse, DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM,
};
use crate::database::models::{DishStatus, DishWithRefs};
use crate::error::ApiError;

/// Browse query. Multi-value parameters (`category`, `region`, `taste`) are
/// comma-separated, e.g. `?category=pho,bun&taste=spicy,sour`.
#[derive(Debug, Default, Deserialize)]
pub struct ListDishesQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub taste: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedDishes {
    pub data: Vec<DishResponse>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Split a comma-separated multi-value parameter
fn parse_csv_param(raw: &Option<String>) -> Vec<String> {
    raw.as_deref()
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Map a taste filter name to its level column. A named taste means
/// "level >= 5" on that column.
fn taste_column(name: &str) -> Option<&'static str> {
    match name {
        "spicy" => Some("spiciness_level"),
        "salty" => Some("saltiness_level"),
        "sweet" => Some("sweetness_level"),
        "sour" => Some("sourness_level"),
        _ => None,
    }
}

struct DishFilters {
    search: Option<String>,
    category_slugs: Vec<String>,
    region_codes: Vec<String>,
    taste_columns: Vec<&'static str>,
}

impl DishFilters {
    fn from_query(query: &ListDishesQuery) -> Self {
        let taste_columns = parse_csv_param(&query.taste)
            .iter()
            .filter_map(|t| taste_column(t))
            .collect();

        Self {
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            category_slugs: parse_csv_param(&query.category),
            region_codes: parse_csv_param(&query.region),
            taste_columns,
        }
    }

    /// Append the approved-only WHERE clause shared by the page and count queries
    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE d.status = ");
        qb.push_bind(DishStatus::Approved.as_str());

        if let Some(search) = &self.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (d.name_japanese ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR d.name_vietnamese ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        if !self.category_slugs.is_empty() {
            qb.push(" AND c.slug = ANY(");
            qb.push_bind(self.category_slugs.clone());
            qb.push(")");
        }

        if !self.region_codes.is_empty() {
            qb.push(" AND r.code = ANY(");
            qb.push_bind(self.region_codes.clone());
            qb.push(")");
        }

        // Column names come from the fixed taste_column mapping, never from input
        for column in &self.taste_columns {
            qb.push(format!(" AND d.{} >= 5", column));
        }
    }
}

/// GET /api/dishes: public, approved dishes only
pub async fn list_dishes(
    Query(query): Query<ListDishesQuery>,
) -> Result<Json<PaginatedDishes>, ApiError> {
    let api = &config::config().api;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(api.default_page_size)
        .clamp(1, api.max_page_size);
    let offset = (page - 1) * limit;

    let filters = DishFilters::from_query(&query);
    let pool = DatabaseManager::pool().await?;

    let mut data_query: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
        "SELECT {} {}",
        DISH_WITH_REFS_COLUMNS, DISH_WITH_REFS_FROM
    ));
    filters.push_where(&mut data_query);

    match query.sort.as_deref() {
        Some("popular") => data_query.push(" ORDER BY d.view_count DESC"),
        _ => data_query.push(" ORDER BY d.reviewed_at DESC NULLS LAST"),
    };
    data_query.push(" LIMIT ");
    data_query.push_bind(limit);
    data_query.push(" OFFSET ");
    data_query.push_bind(offset);

    let rows = data_query
        .build_query_as::<DishWithRefs>()
        .fetch_all(&pool)
        .await?;

    let mut count_query: QueryBuilder<'_, Postgres> =
        QueryBuilder::new(format!("SELECT COUNT(*) {}", DISH_WITH_REFS_FROM));
    filters.push_where(&mut count_query);

    let (total,): (i64,) = count_query.build_query_as().fetch_one(&pool).await?;

    let data: Vec<DishResponse> = rows.iter().map(|d| d.to_public()).collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(PaginatedDishes {
        data,
        page,
        limit,
        total,
        total_pages,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_params_split_and_trim() {
        let raw = Some(" pho, bun ,,mi ".to_string());
        assert_eq!(parse_csv_param(&raw), vec!["pho", "bun", "mi"]);
        assert!(parse_csv_param(&None).is_empty());
        assert!(parse_csv_param(&Some("".into())).is_empty());
    }

    #[test]
    fn taste_names_map_to_level_columns() {
        assert_eq!(taste_column("spicy"), Some("spiciness_level"));
        assert_eq!(taste_column("salty"), Some("saltiness_level"));
        assert_eq!(taste_column("sweet"), Some("sweetness_level"));
        assert_eq!(taste_column("sour"), Some("sourness_level"));
        assert_eq!(taste_column("umami"), None);
    }

    #[test]
    fn unknown_taste_names_are_ignored() {
        let query = ListDishesQuery {
            taste: Some("spicy,umami,sour".into()),
            ..Default::default()
        };
        let filters = DishFilters::from_query(&query);
        assert_eq!(filters.taste_columns, vec!["spiciness_level", "sourness_level"]);
    }

    #[test]
    fn blank_search_is_dropped() {
        let query = ListDishesQuery {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(DishFilters::from_query(&query).search.is_none());
    }
}
