//! services/api/src/web/lesson.rs
//!
//! Axum handlers for the conversation turn loop and the speech endpoints. The server
//! keeps no conversation state; the client sends the history with every request.

use crate::error::{ApiError, ErrorResponse};
use crate::web::protocol::{
    ChatMessageDto, ChatRequest, ChatResponse, SpeechRequest, SummaryRequest, SummaryResponse,
    TranscriptionResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::{debug, info};
use tutor_core::domain::{ChatMessage, Level};
use tutor_core::tutor::{
    conversation_messages, scenario_system_prompt, summary_messages, tutor_system_prompt,
};

const DEFAULT_THEME: &str = "daily conversation";

/// Run one conversation turn.
///
/// With `scenario_id` the tutor role-plays that scenario; otherwise it holds a free
/// conversation at the given level and theme.
#[utoipa::path(
    post,
    path = "/lesson/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The tutor's reply and the extended history", body = ChatResponse),
        (status = 400, description = "Empty input or unknown level", body = ErrorResponse),
        (status = 404, description = "Unknown scenario", body = ErrorResponse),
        (status = 503, description = "AI provider failure", body = ErrorResponse)
    ),
    tag = "lesson"
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let user_text = request.user_text.trim();
    if user_text.is_empty() {
        return Err(ApiError::invalid_request("user_text must not be empty"));
    }

    let system_prompt = match request.scenario_id.as_deref() {
        Some(scenario_id) => {
            let store = app_state.scenarios.read().await;
            let scenario = store.get(scenario_id).ok_or_else(|| {
                ApiError::not_found(format!("Scenario '{scenario_id}' not found"))
            })?;
            scenario_system_prompt(scenario)
        }
        None => {
            let level = match request.level.as_deref() {
                Some(level) => level
                    .parse::<Level>()
                    .map_err(|e| ApiError::invalid_request(e.to_string()))?,
                None => Level::default(),
            };
            let theme = request
                .theme
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_THEME);
            tutor_system_prompt(level, theme)
        }
    };

    let history: Vec<ChatMessage> = request
        .conversation_history
        .iter()
        .map(ChatMessage::from)
        .collect();
    let mut messages = conversation_messages(system_prompt, &history, user_text);
    debug!(turns = history.len(), "Running conversation turn");

    let ai_text = app_state.conversation.complete(&messages).await?;
    messages.push(ChatMessage::assistant(ai_text.clone()));

    // The system prompt is rebuilt on every turn, so it is not echoed back.
    let updated_conversation_history = messages
        .iter()
        .skip(1)
        .map(ChatMessageDto::from)
        .collect();
    Ok(Json(ChatResponse {
        ai_text,
        updated_conversation_history,
    }))
}

/// Summarise a finished conversation: strengths, weak points and advice.
#[utoipa::path(
    post,
    path = "/lesson/summary",
    request_body = SummaryRequest,
    responses(
        (status = 200, description = "The learning summary", body = SummaryResponse),
        (status = 400, description = "Empty history", body = ErrorResponse),
        (status = 503, description = "AI provider failure", body = ErrorResponse)
    ),
    tag = "lesson"
)]
pub async fn summary_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    if request.conversation_history.is_empty() {
        return Err(ApiError::invalid_request(
            "conversation_history must not be empty",
        ));
    }
    let history: Vec<ChatMessage> = request
        .conversation_history
        .iter()
        .map(ChatMessage::from)
        .collect();
    let summary = app_state
        .summarizer
        .complete(&summary_messages(&history))
        .await?;
    Ok(Json(SummaryResponse { summary }))
}

/// Transcribe an uploaded recording.
///
/// Accepts multipart/form-data with an `audio` (or `file`) part and an optional
/// `language` part.
#[utoipa::path(
    post,
    path = "/speech-to-text",
    request_body(content_type = "multipart/form-data", description = "The recording to transcribe."),
    responses(
        (status = 200, description = "Transcribed text", body = TranscriptionResponse),
        (status = 400, description = "Missing, empty or oversize audio", body = ErrorResponse),
        (status = 503, description = "AI provider failure", body = ErrorResponse)
    ),
    tag = "speech"
)]
pub async fn speech_to_text_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let mut audio = None;
    let mut language = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Audio(format!("Failed to read multipart data: {}", e)))?
    {
        match field.name() {
            Some("audio") | Some("file") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Audio(format!("Failed to read audio bytes: {}", e)))?;
                audio = Some(data);
            }
            Some("language") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::invalid_request(e.to_string()))?;
                language = Some(value.trim().to_string());
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| {
        ApiError::Audio("Multipart form must include an audio part".to_string())
    })?;
    if audio.is_empty() {
        return Err(ApiError::Audio("Uploaded audio is empty".to_string()));
    }
    if audio.len() > app_state.config.max_upload_bytes {
        return Err(ApiError::Audio(format!(
            "Uploaded audio exceeds {} bytes",
            app_state.config.max_upload_bytes
        )));
    }

    let language = language.unwrap_or_else(|| app_state.config.stt_language.clone());
    let text = app_state
        .sst_adapter
        .transcribe_audio(&audio, &language)
        .await?;
    info!(bytes = audio.len(), chars = text.chars().count(), "Audio transcribed");
    Ok(Json(TranscriptionResponse { text }))
}

/// Synthesize speech; responds with `audio/mpeg` bytes.
#[utoipa::path(
    post,
    path = "/text-to-speech",
    request_body = SpeechRequest,
    responses(
        (status = 200, description = "MP3 audio", content_type = "audio/mpeg"),
        (status = 400, description = "Empty text or unknown voice", body = ErrorResponse),
        (status = 503, description = "AI provider failure", body = ErrorResponse)
    ),
    tag = "speech"
)]
pub async fn text_to_speech_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SpeechRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::invalid_request("text must not be empty"));
    }
    let voice = request
        .voice
        .unwrap_or_else(|| app_state.config.tts_voice.clone());
    let audio = app_state
        .tts_adapter
        .generate_audio(&request.text, &voice)
        .await?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}
