//! crates/tutor_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage or AI provider implementations.

use async_trait::async_trait;
use crate::domain::{ChatMessage, ProgressRecord, ScenarioRecord};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// Storage failures and external-provider failures are kept distinguishable so the
/// conversation driver can report them differently.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("AI provider error: {0}")]
    Provider(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Ports
//=========================================================================================

#[async_trait]
pub trait ScenarioRepository: Send + Sync {
    /// Loads every readable scenario. Implementations skip (and log) individual
    /// records that cannot be decoded instead of failing the whole load.
    async fn load_all(&self) -> PortResult<Vec<ScenarioRecord>>;

    /// Writes one scenario, replacing any previous record with the same id.
    async fn save(&self, scenario: &ScenarioRecord) -> PortResult<()>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Returns `Ok(None)` when the learner has no stored progress yet.
    async fn load(&self, learner_id: &str) -> PortResult<Option<ProgressRecord>>;

    /// Rewrites the learner's whole document.
    async fn save(&self, progress: &ProgressRecord) -> PortResult<()>;
}

//=========================================================================================
// AI Provider Ports
//=========================================================================================

#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Generates the next assistant message for an ordered list of role-tagged messages.
    async fn complete(&self, messages: &[ChatMessage]) -> PortResult<String>;
}

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes audio data. Returns an empty string when nothing audible was captured.
    async fn transcribe_audio(&self, audio_data: &[u8], language: &str) -> PortResult<String>;
}

#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Generates audio data from a string of text in the requested voice.
    async fn generate_audio(&self, text: &str, voice: &str) -> PortResult<Vec<u8>>;
}
