//! Offline intent extraction.
//!
//! Used whenever the language model is unconfigured, slow, or returns
//! something unusable. Pure and deterministic: the same text always yields
//! the same [`ExtractedIntent`], and nothing here can fail.

use std::sync::LazyLock;

use regex::Regex;

use crate::intent::{ExtractedIntent, SearchIntent, normalize_keywords};

/// Campus locations the fallback recognizes, in canonical spelling.
pub const KNOWN_LOCATIONS: &[&str] = &[
    "library",
    "cafeteria",
    "canteen",
    "gym",
    "hostel",
    "dorm",
    "parking lot",
    "auditorium",
    "lab",
    "classroom",
    "lecture hall",
    "student center",
    "main gate",
    "bus stop",
    "sports ground",
    "admin block",
];

const LOST_CUES: &[&str] = &[
    "lost",
    "missing",
    "misplaced",
    "can't find",
    "cant find",
    "cannot find",
];

const FOUND_CUES: &[&str] = &["found", "saw", "spotted", "picked up"];

const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "with", "without", "from", "near", "around", "this", "that",
    "these", "those", "was", "were", "are", "been", "has", "have", "had", "its", "our", "your",
    "you", "his", "her", "their", "them", "they", "she", "him", "can", "cant", "cannot", "not",
    "did", "does", "any", "anyone", "anybody", "someone", "somebody", "some", "something",
    "please", "help", "looking", "look", "searching", "search", "find", "item", "items", "thing",
    "lost", "lose", "losing", "missing", "misplaced", "found", "saw", "seen", "spotted",
    "picked", "yesterday", "today", "tonight", "morning", "afternoon", "evening", "last",
    "week", "day", "there", "here", "where", "when", "left", "behind", "maybe", "think",
    "just", "like", "about", "got", "get", "one", "also", "very", "really", "hello", "hey",
    "know", "inside", "outside", "into", "onto", "next", "while", "during", "after", "before",
    "what", "which", "who", "whom", "whose", "why", "how", "should", "would", "could", "might",
    "must", "will", "shall", "now", "then", "all", "out", "off", "over", "under", "again",
    "still", "yet", "only", "too", "than", "need", "want", "wanted", "trying",
    "anywhere", "somewhere", "everywhere", "thanks", "thank",
];

/// Words after which a misspelled token is read as a place.
const PLACE_PREPOSITIONS: &[&str] = &["in", "at", "near", "by", "around", "inside", "outside"];

/// Skipped between a place preposition and the place itself.
const DETERMINERS: &[&str] = &["the", "a", "an", "my", "our", "that", "this"];

/// Tokens shorter than this never become keywords.
const MIN_KEYWORD_LEN: usize = 3;

/// Jaro-Winkler similarity needed for a token to count as a misspelled location.
const FUZZY_LOCATION_MIN: f64 = 0.92;

const FUZZY_MIN_LEN: usize = 4;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("valid token regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocationMatch {
    name: &'static str,
    /// Token that matched fuzzily, when the location was not spelled exactly
    fuzzy_token: Option<String>,
}

impl LocationMatch {
    fn consumes(&self, token: &str) -> bool {
        self.name.split(' ').any(|part| part == token)
            || self.fuzzy_token.as_deref() == Some(token)
    }
}

/// Extract intent, keywords and location from free text without a model.
pub fn extract(text: &str) -> ExtractedIntent {
    let lowered = normalize_text(text);
    let tokens: Vec<&str> = TOKEN_RE.find_iter(&lowered).map(|m| m.as_str()).collect();

    let intent = infer_intent(&lowered);
    let location = detect_location(&lowered, &tokens);
    let keywords = normalize_keywords(tokens.iter().copied().filter(|token| {
        token.len() >= MIN_KEYWORD_LEN
            && !STOP_WORDS.contains(token)
            && !location.as_ref().is_some_and(|found| found.consumes(token))
    }));

    ExtractedIntent {
        intent,
        keywords,
        location: location.map(|found| found.name.to_string()),
    }
}

/// Classify by cue substrings. Lost cues win when both kinds appear:
/// "lost my keys, has anyone found them?" is still a person looking.
pub fn infer_intent(text: &str) -> SearchIntent {
    let lowered = normalize_text(text);
    if LOST_CUES.iter().any(|cue| lowered.contains(cue)) {
        SearchIntent::Lost
    } else if FOUND_CUES.iter().any(|cue| lowered.contains(cue)) {
        SearchIntent::Found
    } else {
        SearchIntent::General
    }
}

/// Lowercase and fold typographic apostrophes (phone keyboards) to ASCII.
fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

fn detect_location(lowered: &str, tokens: &[&str]) -> Option<LocationMatch> {
    let exact = KNOWN_LOCATIONS
        .iter()
        .filter_map(|&name| find_word(lowered, name).map(|pos| (pos, name)))
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())));

    if let Some((_, name)) = exact {
        return Some(LocationMatch {
            name,
            fuzzy_token: None,
        });
    }

    place_candidates(tokens)
        .filter(|token| token.len() >= FUZZY_MIN_LEN && !STOP_WORDS.contains(token))
        .find_map(|token| {
            KNOWN_LOCATIONS
                .iter()
                .filter(|name| name.len() >= FUZZY_MIN_LEN && !name.contains(' '))
                .map(|&name| (name, strsim::jaro_winkler(token, name)))
                .filter(|(_, score)| *score >= FUZZY_LOCATION_MIN)
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(name, _)| LocationMatch {
                    name,
                    fuzzy_token: Some(token.to_string()),
                })
        })
}

/// Tokens standing where a place would: the first word after a place
/// preposition, skipping determiners ("in the auditorum").
fn place_candidates<'a>(tokens: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| PLACE_PREPOSITIONS.contains(*token))
        .filter_map(|(index, _)| {
            tokens[index + 1..]
                .iter()
                .copied()
                .find(|token| !DETERMINERS.contains(token))
        })
}

/// Byte offset of `needle` in `haystack` where it stands as whole words
/// (so "lab" does not match inside "label").
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .match_indices(needle)
        .map(|(start, _)| start)
        .find(|&start| {
            let end = start + needle.len();
            let clear_before = haystack[..start]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric());
            let clear_after = haystack[end..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
            clear_before && clear_after
        })
}
