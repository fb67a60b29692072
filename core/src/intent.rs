use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::items::ItemStatus;

/// Upper bound on keywords carried into a search.
pub const MAX_KEYWORDS: usize = 5;

/// What the person asking is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchIntent {
    /// "I lost my ...": look through items other people found
    Lost,
    /// "I found a ...": look through items other people reported lost
    Found,
    /// No stated direction; search everything
    General,
}

impl SearchIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchIntent::Lost => "lost",
            SearchIntent::Found => "found",
            SearchIntent::General => "general",
        }
    }

    /// Status of the items worth showing for this intent.
    ///
    /// Someone who lost something wants the found reports, and vice versa.
    pub fn target_status(self) -> Option<ItemStatus> {
        match self {
            SearchIntent::Lost => Some(ItemStatus::Found),
            SearchIntent::Found => Some(ItemStatus::Lost),
            SearchIntent::General => None,
        }
    }

    fn from_loose(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "lost" => SearchIntent::Lost,
            "found" => SearchIntent::Found,
            _ => SearchIntent::General,
        }
    }
}

/// Intent, keywords and location pulled out of a free-text query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExtractedIntent {
    pub intent: SearchIntent,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ExtractedIntent {
    pub fn general() -> Self {
        Self {
            intent: SearchIntent::General,
            keywords: Vec::new(),
            location: None,
        }
    }
}

/// Raw JSON answer from the language model, before normalization.
///
/// Models do not reliably follow a schema, so every field is optional and
/// keywords may arrive either as a list or as one comma-separated string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelIntentPayload {
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub keywords: Option<KeywordsField>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeywordsField {
    List(Vec<String>),
    Joined(String),
}

impl From<ModelIntentPayload> for ExtractedIntent {
    fn from(payload: ModelIntentPayload) -> Self {
        let intent = payload
            .intent
            .as_deref()
            .map(SearchIntent::from_loose)
            .unwrap_or(SearchIntent::General);

        let raw_keywords: Vec<String> = match payload.keywords {
            Some(KeywordsField::List(list)) => list,
            Some(KeywordsField::Joined(joined)) => {
                joined.split(',').map(str::to_string).collect()
            }
            None => Vec::new(),
        };

        Self {
            intent,
            keywords: normalize_keywords(raw_keywords),
            location: payload.location.as_deref().and_then(normalize_location),
        }
    }
}

/// Trim, lowercase, drop empties and duplicates, cap at [`MAX_KEYWORDS`].
pub fn normalize_keywords<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keywords: Vec<String> = Vec::new();
    for keyword in raw {
        let keyword = keyword.as_ref().trim().to_lowercase();
        if keyword.is_empty() || keywords.contains(&keyword) {
            continue;
        }
        keywords.push(keyword);
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }
    keywords
}

fn normalize_location(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
    {
        return None;
    }
    Some(trimmed.to_string())
}
