//! Prompt text for the two model calls and parsing of their answers.

use lostfound_core::intent::{ExtractedIntent, ModelIntentPayload};
use lostfound_core::items::Item;

use crate::llm::ModelError;

/// Replies longer than this are cut at a word boundary.
const MAX_REPLY_CHARS: usize = 600;

pub const INTENT_SYSTEM_PROMPT: &str = r#"You help students search a university lost and found board.

Read the user's message and classify it:
- "lost": the user lost something and is looking for it
- "found": the user found or saw something that belongs to someone else
- "general": anything else

Extract up to 5 short keywords describing the item (object, color, brand, material).
Do not include words about losing or finding, and do not include the location.
Extract the place on campus where it happened, or null if none is mentioned.

Respond with ONLY valid JSON:
{"intent": "lost" | "found" | "general", "keywords": ["..."], "location": "..." | null}"#;

pub const REPLY_SYSTEM_PROMPT: &str = r#"You are the assistant of a university lost and found board.
You are given the user's message and a numbered list of matching item reports.
Write one or two friendly sentences telling the user what was found and what to do next.
Only mention items from the list. Do not invent details, contact information, or items.
Plain text only, no markdown."#;

pub fn reply_user_prompt(query: &str, intent: &ExtractedIntent, items: &[Item]) -> String {
    let mut prompt = format!(
        "User message: {query}\nSearch intent: {}\nMatching items:\n",
        intent.intent.as_str()
    );
    for (index, item) in items.iter().enumerate() {
        prompt.push_str(&format!("{}. {} [{}]", index + 1, item.title, item.status));
        if let Some(location) = &item.location {
            prompt.push_str(&format!(" at {location}"));
        }
        if let Some(date) = item.event_date {
            prompt.push_str(&format!(" on {date}"));
        }
        if let Some(description) = &item.description {
            prompt.push_str(&format!(" - {description}"));
        }
        prompt.push('\n');
    }
    prompt
}

/// Parse the intent answer, tolerating code fences and surrounding prose.
pub fn parse_intent_answer(answer: &str) -> Result<ExtractedIntent, ModelError> {
    let body = strip_code_fence(answer);
    let payload = serde_json::from_str::<ModelIntentPayload>(body).or_else(|first_err| {
        embedded_object(body)
            .and_then(|object| serde_json::from_str::<ModelIntentPayload>(object).ok())
            .ok_or_else(|| ModelError::InvalidPayload(first_err.to_string()))
    })?;
    Ok(payload.into())
}

/// Trim the model's reply into something safe to show verbatim.
pub fn clean_reply(answer: &str) -> Option<String> {
    let trimmed = strip_code_fence(answer).trim_matches(|c: char| c == '"' || c.is_whitespace());
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() <= MAX_REPLY_CHARS {
        return Some(trimmed.to_string());
    }

    let cut: String = trimmed.chars().take(MAX_REPLY_CHARS).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(end) => &cut[..end],
        None => cut.as_str(),
    };
    Some(format!("{}…", cut.trim_end()))
}

fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
    }

    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }

    trimmed
}

fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
