use std::sync::Arc;

use crate::assist::SearchAssistant;
use crate::store::ItemStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ItemStore>,
    pub assistant: Arc<SearchAssistant>,
}
