use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use lostfound_core::filter::{ItemFilter, like_pattern};
use lostfound_core::items::{Item, ItemStatus};

const ITEM_COLUMNS: &str =
    "id, title, description, category, location, status, image_url, event_date, reported_by, created_at";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("item query failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read access to reported items.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn search(&self, filter: &ItemFilter) -> Result<Vec<Item>, StoreError>;

    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> bool;
}

pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn search(&self, filter: &ItemFilter) -> Result<Vec<Item>, StoreError> {
        let rows = build_search_query(filter)
            .build_query_as::<ItemRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().filter_map(ItemRow::into_item).collect())
    }

    async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

/// Internal row type for sqlx mapping (snake_case, status as text)
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    category: Option<String>,
    location: Option<String>,
    status: String,
    image_url: Option<String>,
    event_date: Option<NaiveDate>,
    reported_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> Option<Item> {
        let status = match self.status.parse::<ItemStatus>() {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(item_id = %self.id, error = %err, "skipping item row");
                return None;
            }
        };

        Some(Item {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            location: self.location,
            status,
            image_url: self.image_url,
            event_date: self.event_date,
            reported_by: self.reported_by,
            created_at: self.created_at,
        })
    }
}

/// SQL rendition of [`ItemFilter::apply`].
fn build_search_query(filter: &ItemFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM items WHERE TRUE"));

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }

    if !filter.keywords.is_empty() {
        query.push(" AND (");
        for (index, keyword) in filter.keywords.iter().enumerate() {
            if index > 0 {
                query.push(" OR ");
            }
            let pattern = like_pattern(keyword);
            query
                .push("title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR category ILIKE ")
                .push_bind(pattern);
        }
        query.push(")");
    }

    if let Some(location) = &filter.location {
        query
            .push(" AND location ILIKE ")
            .push_bind(like_pattern(location));
    }

    query
        .push(" ORDER BY event_date DESC NULLS LAST, created_at DESC LIMIT ")
        .push_bind(filter.limit as i64);
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_filter_renders_grouped_keywords() {
        let filter = ItemFilter {
            status: Some(ItemStatus::Found),
            keywords: vec!["wallet".to_string(), "blue".to_string()],
            location: Some("library".to_string()),
            limit: 10,
        };

        let query = build_search_query(&filter);
        assert_eq!(
            query.sql(),
            format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE TRUE AND status = $1 \
                 AND (title ILIKE $2 OR description ILIKE $3 OR category ILIKE $4 \
                 OR title ILIKE $5 OR description ILIKE $6 OR category ILIKE $7) \
                 AND location ILIKE $8 \
                 ORDER BY event_date DESC NULLS LAST, created_at DESC LIMIT $9"
            )
        );
    }

    #[test]
    fn empty_filter_only_orders_and_limits() {
        let filter = ItemFilter {
            status: None,
            keywords: Vec::new(),
            location: None,
            limit: 5,
        };

        let query = build_search_query(&filter);
        assert_eq!(
            query.sql(),
            format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE TRUE \
                 ORDER BY event_date DESC NULLS LAST, created_at DESC LIMIT $1"
            )
        );
    }

    #[test]
    fn unknown_status_rows_are_skipped() {
        let row = ItemRow {
            id: Uuid::nil(),
            title: "Jacket".to_string(),
            description: None,
            category: None,
            location: None,
            status: "archived".to_string(),
            image_url: None,
            event_date: None,
            reported_by: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        assert!(row.into_item().is_none());
    }
}
