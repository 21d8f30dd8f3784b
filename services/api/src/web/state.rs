//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tutor_core::ports::{
    ConversationService, PortResult, ProgressRepository, SpeechToTextService,
    TextToSpeechService,
};
use tutor_core::{ProgressStore, ScenarioStore};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub scenarios: RwLock<ScenarioStore>,
    pub progress_repo: Arc<dyn ProgressRepository>,
    /// Serializes progress mutations inside this process. Other processes writing the
    /// same directory are not coordinated with.
    pub progress_lock: Mutex<()>,
    pub conversation: Arc<dyn ConversationService>,
    pub summarizer: Arc<dyn ConversationService>,
    pub sst_adapter: Arc<dyn SpeechToTextService>,
    pub tts_adapter: Arc<dyn TextToSpeechService>,
}

impl AppState {
    /// Loads the learner's progress fresh from the repository.
    pub async fn open_progress(&self, learner_id: &str) -> PortResult<ProgressStore> {
        ProgressStore::open(learner_id, self.progress_repo.clone()).await
    }
}
