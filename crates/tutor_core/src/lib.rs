pub mod analysis;
pub mod domain;
pub mod memory;
pub mod ports;
pub mod progress;
pub mod scenarios;
pub mod seed;
pub mod tutor;

pub use analysis::{LearningReport, SessionAnalysis, SessionFrequency, Trend, VocabularyMastery};
pub use domain::{
    AssessmentCategory, ChatMessage, ChatRole, FavoriteKind, Level, LearningSummary,
    ProgressRecord, ScenarioRecord, SessionRecord,
};
pub use ports::{
    ConversationService, PortError, PortResult, ProgressRepository, ScenarioRepository,
    SpeechToTextService, TextToSpeechService,
};
pub use progress::ProgressStore;
pub use scenarios::ScenarioStore;
