//! services/api/src/web/protocol.rs
//!
//! Defines the JSON message shapes exchanged between the browser client and the API
//! server, and their conversions to and from the core domain types.

use serde::{Deserialize, Serialize};
use tutor_core::analysis::{LearningReport, SessionAnalysis, VocabularyMastery};
use tutor_core::domain::{
    ChatMessage, ChatRole, ExamplePhrase, GrammarPoint, LearningSummary, Level, ScenarioRecord,
    VocabularyItem,
};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;

//=========================================================================================
// Conversation Messages
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry of the conversation history. The client keeps the history and sends it
/// back with every turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ChatMessageDto {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessageDto> for ChatMessage {
    fn from(dto: &ChatMessageDto) -> Self {
        let role = match dto.role {
            Role::System => ChatRole::System,
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        };
        ChatMessage {
            role,
            content: dto.content.clone(),
        }
    }
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::System => Role::System,
            ChatRole::User => Role::User,
            ChatRole::Assistant => Role::Assistant,
        };
        Self {
            role,
            content: message.content.clone(),
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ChatRequest {
    pub user_text: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessageDto>,
    /// `beginner`, `intermediate` or `advanced`. Ignored when `scenario_id` is set.
    pub level: Option<String>,
    pub theme: Option<String>,
    /// Role-play the given scenario instead of free conversation.
    pub scenario_id: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ChatResponse {
    pub ai_text: String,
    pub updated_conversation_history: Vec<ChatMessageDto>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SummaryRequest {
    #[serde(default)]
    pub conversation_history: Vec<ChatMessageDto>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

//=========================================================================================
// Speech
//=========================================================================================

#[derive(Serialize, Debug, ToSchema)]
pub struct TranscriptionResponse {
    pub text: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SpeechRequest {
    pub text: String,
    /// Falls back to the configured default voice.
    pub voice: Option<String>,
}

//=========================================================================================
// Scenarios
//=========================================================================================

#[derive(Deserialize, Debug, IntoParams)]
pub struct ScenarioQuery {
    pub level: Option<String>,
    pub theme: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct PhraseDto {
    pub source_text: String,
    #[serde(default)]
    pub translated_text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct VocabularyItemDto {
    pub term: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub example_sentence: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct GrammarPointDto {
    pub point_name: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub example_sentence: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct ScenarioDto {
    /// Ignored on `PUT`, where the path id wins. Generated on `POST` when empty.
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub level: String,
    pub theme: String,
    #[serde(default)]
    pub example_phrases: Vec<PhraseDto>,
    #[serde(default)]
    pub key_vocabulary: Vec<VocabularyItemDto>,
    #[serde(default)]
    pub grammar_points: Vec<GrammarPointDto>,
}

impl From<&ScenarioRecord> for ScenarioDto {
    fn from(record: &ScenarioRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            level: record.level.as_str().to_string(),
            theme: record.theme.clone(),
            example_phrases: record
                .example_phrases
                .iter()
                .map(|p| PhraseDto {
                    source_text: p.source_text.clone(),
                    translated_text: p.translated_text.clone(),
                })
                .collect(),
            key_vocabulary: record
                .key_vocabulary
                .iter()
                .map(|v| VocabularyItemDto {
                    term: v.term.clone(),
                    definition: v.definition.clone(),
                    example_sentence: v.example_sentence.clone(),
                })
                .collect(),
            grammar_points: record
                .grammar_points
                .iter()
                .map(|g| GrammarPointDto {
                    point_name: g.point_name.clone(),
                    explanation: g.explanation.clone(),
                    example_sentence: g.example_sentence.clone(),
                })
                .collect(),
        }
    }
}

impl ScenarioDto {
    pub fn into_domain(self, id: String) -> Result<ScenarioRecord, ApiError> {
        let level = self
            .level
            .parse::<Level>()
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        if self.theme.trim().is_empty() {
            return Err(ApiError::invalid_request("Scenario theme must not be empty"));
        }
        Ok(ScenarioRecord {
            id,
            title: self.title,
            description: self.description,
            level,
            theme: self.theme,
            example_phrases: self
                .example_phrases
                .into_iter()
                .map(|p| ExamplePhrase {
                    source_text: p.source_text,
                    translated_text: p.translated_text,
                })
                .collect(),
            key_vocabulary: self
                .key_vocabulary
                .into_iter()
                .map(|v| VocabularyItem {
                    term: v.term,
                    definition: v.definition,
                    example_sentence: v.example_sentence,
                })
                .collect(),
            grammar_points: self
                .grammar_points
                .into_iter()
                .map(|g| GrammarPoint {
                    point_name: g.point_name,
                    explanation: g.explanation,
                    example_sentence: g.example_sentence,
                })
                .collect(),
        })
    }
}

//=========================================================================================
// Progress
//=========================================================================================

#[derive(Deserialize, Debug, IntoParams)]
pub struct CountQuery {
    pub count: Option<usize>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RecordSessionRequest {
    pub scenario_id: String,
    pub duration_minutes: u32,
    pub conversation_turns: u32,
    /// Share of successful turns, within `[0, 1]`.
    pub accuracy_rate: f64,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct VocabularyResultRequest {
    pub term: String,
    pub correct: bool,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LevelUpdateRequest {
    /// `overall`, `speaking`, `listening`, `vocabulary` or `grammar`.
    pub category: String,
    pub level: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ProfileRequest {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct IdListResponse {
    pub items: Vec<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct LearningSummaryDto {
    pub learner_id: String,
    pub total_sessions: u32,
    pub total_time_minutes: u64,
    pub vocab_learned_count: u32,
    pub scenarios_completed: usize,
    pub current_level: String,
    /// The level label shown to the learner, e.g. `初級`.
    pub current_level_label: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

impl LearningSummaryDto {
    pub fn new(learner_id: &str, summary: &LearningSummary) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            total_sessions: summary.total_sessions,
            total_time_minutes: summary.total_time_minutes,
            vocab_learned_count: summary.vocab_learned_count,
            scenarios_completed: summary.scenarios_completed,
            current_level: summary.current_level.as_str().to_string(),
            current_level_label: summary.current_level.label().to_string(),
            strengths: summary.strengths.clone(),
            weaknesses: summary.weaknesses.clone(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SessionAnalysisDto {
    pub average_accuracy: f64,
    pub recent_accuracy: f64,
    pub trend: String,
    pub total_sessions: usize,
    pub total_time: u64,
    pub session_frequency: String,
}

impl From<&SessionAnalysis> for SessionAnalysisDto {
    fn from(analysis: &SessionAnalysis) -> Self {
        Self {
            average_accuracy: analysis.average_accuracy,
            recent_accuracy: analysis.recent_accuracy,
            trend: analysis.trend.to_string(),
            total_sessions: analysis.total_sessions,
            total_time: analysis.total_time,
            session_frequency: analysis.session_frequency.to_string(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct VocabularyMasteryDto {
    pub total_vocabulary: usize,
    pub mastered_count: usize,
    pub learning_count: usize,
    pub struggling_count: usize,
    pub mastery_rate: f64,
}

impl From<&VocabularyMastery> for VocabularyMasteryDto {
    fn from(mastery: &VocabularyMastery) -> Self {
        Self {
            total_vocabulary: mastery.total_vocabulary,
            mastered_count: mastery.mastered_count,
            learning_count: mastery.learning_count,
            struggling_count: mastery.struggling_count,
            mastery_rate: mastery.mastery_rate,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ReportResponse {
    pub summary: LearningSummaryDto,
    pub sessions: SessionAnalysisDto,
    pub vocabulary: VocabularyMasteryDto,
    pub insights: Vec<String>,
}

impl ReportResponse {
    pub fn new(learner_id: &str, report: &LearningReport) -> Self {
        Self {
            summary: LearningSummaryDto::new(learner_id, &report.summary),
            sessions: SessionAnalysisDto::from(&report.sessions),
            vocabulary: VocabularyMasteryDto::from(&report.vocabulary),
            insights: report.insights.clone(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub scenarios: usize,
}
