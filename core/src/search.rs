use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::intent::SearchIntent;
use crate::items::{Item, ItemStatus};

/// Where the intent behind a search came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IntentSource {
    Model,
    Fallback,
}

/// Where the user-facing sentence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Model,
    Template,
}

/// Diagnostics attached to every search response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchDebug {
    /// True when any language-model step failed or was unavailable
    pub fallback: bool,
    /// True when the item store could not be queried
    pub degraded: bool,
    pub intent_source: IntentSource,
    pub reply_source: ReplySource,
    pub intent: SearchIntent,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_status: Option<ItemStatus>,
    /// Short fingerprint of the query text, for correlating logs
    pub query_hash: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub elapsed_ms: u64,
}

/// Response of the AI-assisted search endpoint. Always well-formed, even
/// when every upstream dependency failed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchAssistResponse {
    pub message: String,
    pub results: Vec<Item>,
    pub debug: SearchDebug,
}

/// First 12 hex chars of the SHA-256 of the trimmed query.
pub fn query_fingerprint(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.trim().as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(12);
    digest
}

/// Fixed user-facing copy for when the model is not phrasing the reply.
pub mod messages {
    use super::*;

    pub const SERVICE_DEGRADED: &str =
        "Item search is temporarily unavailable. Please try again in a few minutes.";

    /// How many titles a template summary names before "and N more".
    const SUMMARY_NAMED: usize = 3;

    pub fn no_matches(intent: SearchIntent) -> String {
        match intent {
            SearchIntent::Lost => "No one has reported finding an item like that yet. \
                 Check back soon, or post a lost item report so finders can reach you."
                .to_string(),
            SearchIntent::Found => "No lost item reports match that description yet. \
                 Consider posting it as a found item so its owner can find it."
                .to_string(),
            SearchIntent::General => "No items match your search yet.".to_string(),
        }
    }

    pub fn summarize(intent: SearchIntent, items: &[Item]) -> String {
        if items.is_empty() {
            return no_matches(intent);
        }

        let noun = match intent {
            SearchIntent::Lost => "found item",
            SearchIntent::Found => "lost item report",
            SearchIntent::General => "item",
        };
        let plural = if items.len() == 1 { "" } else { "s" };

        let named: Vec<String> = items
            .iter()
            .take(SUMMARY_NAMED)
            .map(|item| match &item.location {
                Some(location) => format!("{} ({})", item.title, location),
                None => item.title.clone(),
            })
            .collect();
        let rest = items.len().saturating_sub(SUMMARY_NAMED);
        let tail = if rest > 0 {
            format!(", and {rest} more")
        } else {
            String::new()
        };

        format!(
            "I found {} {noun}{plural} that may match: {}{tail}.",
            items.len(),
            named.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use super::messages::*;
    use super::*;

    fn item(title: &str, location: Option<&str>) -> Item {
        Item {
            id: Uuid::nil(),
            title: title.to_string(),
            description: None,
            category: None,
            location: location.map(str::to_string),
            status: ItemStatus::Found,
            image_url: None,
            event_date: None,
            reported_by: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn no_matches_never_reads_as_degraded() {
        for intent in [SearchIntent::Lost, SearchIntent::Found, SearchIntent::General] {
            assert_ne!(no_matches(intent), SERVICE_DEGRADED);
        }
    }

    #[test]
    fn summarize_names_first_three_items() {
        let items = vec![
            item("Blue wallet", Some("Library")),
            item("Keys", None),
            item("Umbrella", Some("Gym")),
            item("Scarf", None),
        ];
        assert_eq!(
            summarize(SearchIntent::Lost, &items),
            "I found 4 found items that may match: Blue wallet (Library), Keys, Umbrella (Gym), and 1 more."
        );
        assert_eq!(
            summarize(SearchIntent::General, &items[..1]),
            "I found 1 item that may match: Blue wallet (Library)."
        );
    }

    #[test]
    fn fingerprint_ignores_surrounding_whitespace() {
        let hash = query_fingerprint("lost wallet");
        assert_eq!(hash.len(), 12);
        assert_eq!(hash, query_fingerprint("  lost wallet \n"));
        assert_ne!(hash, query_fingerprint("found wallet"));
    }
}
