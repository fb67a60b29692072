//! AI-assisted item search.
//!
//! Three steps: extract intent (model, else offline fallback), query the
//! item store, phrase a reply (model, else template). Every failure is
//! absorbed here and reported through `SearchDebug`; callers always get a
//! well-formed response.

pub mod prompts;

use std::sync::Arc;
use std::time::{Duration, Instant};

use lostfound_core::fallback;
use lostfound_core::filter::ItemFilter;
use lostfound_core::intent::ExtractedIntent;
use lostfound_core::items::Item;
use lostfound_core::search::{
    IntentSource, ReplySource, SearchAssistResponse, SearchDebug, messages, query_fingerprint,
};

use crate::llm::{LanguageModel, ModelError, ResponseFormat};
use crate::store::ItemStore;

pub struct SearchAssistant {
    store: Arc<dyn ItemStore>,
    model: Option<Arc<dyn LanguageModel>>,
    default_limit: usize,
    model_timeout: Duration,
}

impl SearchAssistant {
    pub fn new(
        store: Arc<dyn ItemStore>,
        model: Option<Arc<dyn LanguageModel>>,
        default_limit: usize,
        model_timeout: Duration,
    ) -> Self {
        Self {
            store,
            model,
            default_limit,
            model_timeout,
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|model| model.name())
    }

    pub async fn search(&self, query: &str, limit: Option<usize>) -> SearchAssistResponse {
        let started = Instant::now();
        let mut errors = Vec::new();

        let (extracted, intent_source) = self.extract(query, &mut errors).await;
        let filter = ItemFilter::from_intent(&extracted, limit.unwrap_or(self.default_limit));

        let mut search_debug = SearchDebug {
            fallback: intent_source == IntentSource::Fallback,
            degraded: false,
            intent_source,
            reply_source: ReplySource::Template,
            intent: extracted.intent,
            keywords: extracted.keywords.clone(),
            location: extracted.location.clone(),
            search_status: filter.status,
            query_hash: query_fingerprint(query),
            errors: Vec::new(),
            elapsed_ms: 0,
        };

        let (message, results) = match self.store.search(&filter).await {
            Err(err) => {
                tracing::error!(query_hash = %search_debug.query_hash, error = %err, "item search failed");
                errors.push(err.to_string());
                search_debug.degraded = true;
                (messages::SERVICE_DEGRADED.to_string(), Vec::new())
            }
            Ok(items) if items.is_empty() => (messages::no_matches(extracted.intent), items),
            Ok(items) => {
                let message = self
                    .phrase(query, &extracted, &items, &mut search_debug, &mut errors)
                    .await;
                (message, items)
            }
        };

        search_debug.errors = errors;
        search_debug.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            query_hash = %search_debug.query_hash,
            intent = search_debug.intent.as_str(),
            intent_source = ?search_debug.intent_source,
            reply_source = ?search_debug.reply_source,
            keywords = search_debug.keywords.len(),
            location = search_debug.location.is_some(),
            results = results.len(),
            fallback = search_debug.fallback,
            degraded = search_debug.degraded,
            elapsed_ms = search_debug.elapsed_ms,
            "assisted search completed"
        );

        SearchAssistResponse {
            message,
            results,
            debug: search_debug,
        }
    }

    async fn extract(
        &self,
        query: &str,
        errors: &mut Vec<String>,
    ) -> (ExtractedIntent, IntentSource) {
        let Some(model) = self.model.as_deref() else {
            errors.push("language model not configured".to_string());
            return (fallback::extract(query), IntentSource::Fallback);
        };

        let outcome = match self
            .ask(model, prompts::INTENT_SYSTEM_PROMPT, query, ResponseFormat::Json)
            .await
        {
            Ok(answer) => prompts::parse_intent_answer(&answer),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(extracted) => (extracted, IntentSource::Model),
            Err(err) => {
                tracing::warn!(
                    model = model.name(),
                    error = %err,
                    "intent extraction failed, using fallback extractor"
                );
                errors.push(format!("intent extraction: {err}"));
                (fallback::extract(query), IntentSource::Fallback)
            }
        }
    }

    /// Sentence over a non-empty result set. The model is skipped when it
    /// already failed during extraction in this request.
    async fn phrase(
        &self,
        query: &str,
        extracted: &ExtractedIntent,
        items: &[Item],
        debug: &mut SearchDebug,
        errors: &mut Vec<String>,
    ) -> String {
        let template = || messages::summarize(extracted.intent, items);

        let model = match (self.model.as_deref(), debug.intent_source) {
            (Some(model), IntentSource::Model) => model,
            _ => return template(),
        };

        let user_prompt = prompts::reply_user_prompt(query, extracted, items);
        let answer = self
            .ask(
                model,
                prompts::REPLY_SYSTEM_PROMPT,
                &user_prompt,
                ResponseFormat::Text,
            )
            .await
            .and_then(|answer| prompts::clean_reply(&answer).ok_or(ModelError::EmptyResponse));

        match answer {
            Ok(reply) => {
                debug.reply_source = ReplySource::Model;
                reply
            }
            Err(err) => {
                tracing::warn!(
                    model = model.name(),
                    error = %err,
                    "reply phrasing failed, using template"
                );
                errors.push(format!("reply phrasing: {err}"));
                debug.fallback = true;
                template()
            }
        }
    }

    async fn ask(
        &self,
        model: &dyn LanguageModel,
        system: &str,
        user: &str,
        format: ResponseFormat,
    ) -> Result<String, ModelError> {
        match tokio::time::timeout(self.model_timeout, model.complete(system, user, format)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(self.model_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use lostfound_core::intent::SearchIntent;
    use lostfound_core::items::ItemStatus;

    use super::*;
    use crate::testing::{MemoryItemStore, Script, ScriptedModel, sample_items};

    const TIMEOUT: Duration = Duration::from_millis(50);

    fn assistant(store: MemoryItemStore, model: Option<ScriptedModel>) -> SearchAssistant {
        SearchAssistant::new(
            Arc::new(store),
            model.map(|m| Arc::new(m) as Arc<dyn LanguageModel>),
            10,
            TIMEOUT,
        )
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_offline_extraction() {
        let assistant = assistant(
            MemoryItemStore::new(sample_items()),
            Some(ScriptedModel::new(Script::Fail, Script::Fail)),
        );

        let response = assistant
            .search("I lost my wallet somewhere in the Library", None)
            .await;

        assert!(response.debug.fallback);
        assert!(!response.debug.degraded);
        assert_eq!(response.debug.intent_source, IntentSource::Fallback);
        assert_eq!(response.debug.reply_source, ReplySource::Template);
        assert_eq!(response.debug.intent, SearchIntent::Lost);
        assert_eq!(response.debug.search_status, Some(ItemStatus::Found));
        assert_eq!(response.debug.location.as_deref(), Some("library"));
        assert!(response.debug.errors[0].starts_with("intent extraction:"));

        assert!(!response.results.is_empty());
        for item in &response.results {
            assert_eq!(item.status, ItemStatus::Found);
            let location = item.location.as_deref().expect("location filter applies");
            assert!(location.to_lowercase().contains("library"));
        }
        assert!(response.message.starts_with("I found 1 found item"));
    }

    #[tokio::test]
    async fn slow_model_times_out_into_fallback() {
        let assistant = assistant(
            MemoryItemStore::new(sample_items()),
            Some(ScriptedModel::new(Script::Hang, Script::Hang)),
        );

        let response = assistant.search("missing umbrella", None).await;

        assert!(response.debug.fallback);
        assert_eq!(response.debug.intent, SearchIntent::Lost);
        assert!(response.debug.errors[0].contains("timed out"));
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].title, "Black umbrella");
    }

    #[tokio::test]
    async fn unparseable_model_answer_falls_back() {
        let assistant = assistant(
            MemoryItemStore::new(sample_items()),
            Some(ScriptedModel::new(
                Script::Answer("they lost a wallet".to_string()),
                Script::Fail,
            )),
        );

        let response = assistant.search("found a wallet", None).await;
        assert!(response.debug.fallback);
        assert_eq!(response.debug.intent, SearchIntent::Found);
        assert_eq!(response.debug.search_status, Some(ItemStatus::Lost));
    }

    #[tokio::test]
    async fn missing_model_uses_fallback_without_calls() {
        let assistant = assistant(MemoryItemStore::new(sample_items()), None);

        let response = assistant.search("saw a calculator", None).await;
        assert!(response.debug.fallback);
        assert_eq!(response.debug.errors, vec!["language model not configured"]);
        assert_eq!(assistant.model_name(), None);
    }

    #[tokio::test]
    async fn model_extraction_and_reply_are_used_when_healthy() {
        let model = ScriptedModel::new(
            Script::Answer(
                r#"{"intent": "lost", "keywords": ["wallet"], "location": null}"#.to_string(),
            ),
            Script::Answer("Good news: a blue wallet was handed in at the library.".to_string()),
        );
        let assistant = assistant(MemoryItemStore::new(sample_items()), Some(model));

        let response = assistant.search("where is my wallet??", None).await;

        assert!(!response.debug.fallback);
        assert_eq!(response.debug.intent_source, IntentSource::Model);
        assert_eq!(response.debug.reply_source, ReplySource::Model);
        assert!(response.debug.errors.is_empty());
        assert_eq!(
            response.message,
            "Good news: a blue wallet was handed in at the library."
        );
        let titles: Vec<&str> = response.results.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Brown wallet", "Blue wallet"]);
    }

    #[tokio::test]
    async fn empty_results_use_fixed_no_match_message() {
        let model = ScriptedModel::new(
            Script::Answer(r#"{"intent": "lost", "keywords": ["calculator"]}"#.to_string()),
            Script::Fail,
        );
        let assistant = assistant(MemoryItemStore::new(sample_items()), Some(model));

        // the calculator is only reported lost, so nobody has found one yet
        let response = assistant.search("lost my calculator", None).await;
        assert!(response.results.is_empty());
        assert_eq!(response.message, messages::no_matches(SearchIntent::Lost));
        assert!(!response.debug.fallback);
        assert!(response.debug.errors.is_empty());
    }

    #[tokio::test]
    async fn reply_failure_keeps_model_intent_and_marks_fallback() {
        let model = ScriptedModel::new(
            Script::Answer(r#"{"intent": "lost", "keywords": ["wallet"]}"#.to_string()),
            Script::Fail,
        );
        let assistant = assistant(MemoryItemStore::new(sample_items()), Some(model));

        let response = assistant.search("lost wallet", None).await;
        assert_eq!(response.debug.intent_source, IntentSource::Model);
        assert_eq!(response.debug.reply_source, ReplySource::Template);
        assert!(response.debug.fallback);
        assert!(response.debug.errors[0].starts_with("reply phrasing:"));
        assert!(response.message.starts_with("I found 2 found items"));
    }

    #[tokio::test]
    async fn store_failure_reports_degraded_service() {
        let assistant = assistant(
            MemoryItemStore::unavailable(),
            Some(ScriptedModel::new(Script::Fail, Script::Fail)),
        );

        let response = assistant.search("lost my keys at the gym", None).await;

        assert!(response.debug.degraded);
        assert!(response.debug.fallback);
        assert!(response.results.is_empty());
        assert_eq!(response.message, messages::SERVICE_DEGRADED);
        assert_ne!(response.message, messages::no_matches(SearchIntent::Lost));
        assert_eq!(response.debug.errors.len(), 2);
    }

    #[tokio::test]
    async fn explicit_limit_caps_results() {
        let assistant = assistant(MemoryItemStore::new(sample_items()), None);
        let response = assistant.search("wallet", Some(2)).await;

        assert_eq!(response.debug.intent, SearchIntent::General);
        assert_eq!(response.debug.search_status, None);
        let titles: Vec<&str> = response.results.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Brown wallet", "Red wallet"]);
    }
}
