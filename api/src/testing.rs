//! In-process stand-ins for the database and the language model.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use lostfound_core::filter::ItemFilter;
use lostfound_core::items::{Item, ItemStatus};

use crate::llm::{LanguageModel, ModelError, ResponseFormat};
use crate::store::{ItemStore, StoreError};

pub struct MemoryItemStore {
    items: Vec<Item>,
    available: bool,
}

impl MemoryItemStore {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            items: Vec::new(),
            available: false,
        }
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn search(&self, filter: &ItemFilter) -> Result<Vec<Item>, StoreError> {
        if !self.available {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(filter.apply(self.items.clone()))
    }

    async fn ping(&self) -> bool {
        self.available
    }
}

#[derive(Clone)]
pub enum Script {
    Answer(String),
    Fail,
    /// Never answers within any reasonable timeout
    Hang,
}

/// Model that answers JSON-format calls with `intent` and text calls with `reply`.
pub struct ScriptedModel {
    intent: Script,
    reply: Script,
}

impl ScriptedModel {
    pub fn new(intent: Script, reply: Script) -> Self {
        Self { intent, reply }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        format: ResponseFormat,
    ) -> Result<String, ModelError> {
        let script = match format {
            ResponseFormat::Json => &self.intent,
            ResponseFormat::Text => &self.reply,
        };
        match script {
            Script::Answer(text) => Ok(text.clone()),
            Script::Fail => Err(ModelError::Status {
                status: 503,
                body: "overloaded".to_string(),
            }),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(ModelError::EmptyResponse)
            }
        }
    }
}

fn item(
    title: &str,
    status: ItemStatus,
    location: &str,
    category: Option<&str>,
    day: u32,
) -> Item {
    Item {
        id: Uuid::now_v7(),
        title: title.to_string(),
        description: None,
        category: category.map(str::to_string),
        location: Some(location.to_string()),
        status,
        image_url: None,
        event_date: NaiveDate::from_ymd_opt(2026, 10, day),
        reported_by: Some("user_test".to_string()),
        created_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

/// Two found wallets, a found umbrella, a lost wallet and a lost calculator.
pub fn sample_items() -> Vec<Item> {
    vec![
        item("Blue wallet", ItemStatus::Found, "Main Library", Some("accessories"), 2),
        item("Brown wallet", ItemStatus::Found, "Cafeteria", Some("accessories"), 5),
        item("Black umbrella", ItemStatus::Found, "Gym", None, 4),
        item("Red wallet", ItemStatus::Lost, "Parking lot", Some("accessories"), 3),
        item("Calculator", ItemStatus::Lost, "Lecture Hall 3", Some("electronics"), 1),
    ]
}
