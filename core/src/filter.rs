use std::cmp::Ordering;

use serde::Serialize;
use utoipa::ToSchema;

use crate::intent::ExtractedIntent;
use crate::items::{Item, ItemStatus};

pub const DEFAULT_RESULT_LIMIT: usize = 10;
pub const MAX_RESULT_LIMIT: usize = 25;

/// Filter applied to the item table for one search.
///
/// Keywords are OR-combined across title, description and category; the
/// status and location constraints are AND-ed on top. All text comparison
/// is a case-insensitive substring match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ItemFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub limit: usize,
}

impl ItemFilter {
    pub fn from_intent(intent: &ExtractedIntent, limit: usize) -> Self {
        Self {
            status: intent.intent.target_status(),
            keywords: intent.keywords.clone(),
            location: intent.location.clone(),
            limit: clamp_limit(limit),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        if self.status.is_some_and(|status| status != item.status) {
            return false;
        }

        if let Some(location) = &self.location {
            let Some(item_location) = &item.location else {
                return false;
            };
            if !contains_ignore_case(item_location, location) {
                return false;
            }
        }

        if self.keywords.is_empty() {
            return true;
        }

        let fields = [
            Some(item.title.as_str()),
            item.description.as_deref(),
            item.category.as_deref(),
        ];
        self.keywords.iter().any(|keyword| {
            fields
                .iter()
                .flatten()
                .any(|field| contains_ignore_case(field, keyword))
        })
    }

    /// In-memory equivalent of the SQL the item store runs: filter, newest
    /// event first (undated items last), then truncate to the limit.
    pub fn apply<I>(&self, items: I) -> Vec<Item>
    where
        I: IntoIterator<Item = Item>,
    {
        let mut matched: Vec<Item> = items.into_iter().filter(|item| self.matches(item)).collect();
        matched.sort_by(newest_event_first);
        matched.truncate(self.limit);
        matched
    }
}

pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_RESULT_LIMIT)
}

fn newest_event_first(a: &Item, b: &Item) -> Ordering {
    match (a.event_date, b.event_date) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.created_at.cmp(&a.created_at))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `%term%` with LIKE metacharacters escaped (backslash is the Postgres
/// default escape character).
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
