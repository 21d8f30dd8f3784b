//! services/api/src/web/rest.rs
//!
//! Contains the router construction, the health endpoint and the master definition for
//! the OpenAPI specification.

use crate::config::ConfigError;
use crate::error::{ApiError, ErrorResponse};
use crate::web::protocol::{
    ChatMessageDto, ChatRequest, ChatResponse, GrammarPointDto, HealthResponse, IdListResponse,
    LearningSummaryDto, LevelUpdateRequest, PhraseDto, ProfileRequest, RecordSessionRequest,
    ReportResponse, Role, ScenarioDto, SessionAnalysisDto, SpeechRequest, SummaryRequest,
    SummaryResponse, TranscriptionResponse, VocabularyItemDto, VocabularyMasteryDto,
    VocabularyResultRequest,
};
use crate::web::state::AppState;
use crate::web::{lesson, progress, scenarios};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart boundaries and headers on top of the audio itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        scenarios::list_scenarios_handler,
        scenarios::list_levels_handler,
        scenarios::list_themes_handler,
        scenarios::get_scenario_handler,
        scenarios::put_scenario_handler,
        scenarios::create_scenario_handler,
        lesson::chat_handler,
        lesson::summary_handler,
        lesson::speech_to_text_handler,
        lesson::text_to_speech_handler,
        progress::learning_summary_handler,
        progress::report_handler,
        progress::record_session_handler,
        progress::record_vocabulary_handler,
        progress::update_level_handler,
        progress::add_favorite_handler,
        progress::remove_favorite_handler,
        progress::update_profile_handler,
        progress::recommendations_handler,
        progress::review_handler,
    ),
    components(
        schemas(
            ErrorResponse, HealthResponse, Role, ChatMessageDto, ChatRequest, ChatResponse,
            SummaryRequest, SummaryResponse, TranscriptionResponse, SpeechRequest, PhraseDto,
            VocabularyItemDto, GrammarPointDto, ScenarioDto, RecordSessionRequest,
            VocabularyResultRequest, LevelUpdateRequest, ProfileRequest, IdListResponse,
            LearningSummaryDto, SessionAnalysisDto, VocabularyMasteryDto, ReportResponse
        )
    ),
    tags(
        (name = "scenarios", description = "The conversation scenario catalogue."),
        (name = "lesson", description = "Conversation turns with the AI tutor."),
        (name = "speech", description = "Speech recognition and synthesis."),
        (name = "progress", description = "Learner progress tracking and analysis.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        scenarios: app_state.scenarios.read().await.len(),
    })
}

//=========================================================================================
// Router
//=========================================================================================

/// Builds the complete application: API routes, CORS, tracing and Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let body_limit = app_state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/scenarios",
            get(scenarios::list_scenarios_handler).post(scenarios::create_scenario_handler),
        )
        .route("/scenarios/levels", get(scenarios::list_levels_handler))
        .route("/scenarios/themes", get(scenarios::list_themes_handler))
        .route(
            "/scenarios/{id}",
            get(scenarios::get_scenario_handler).put(scenarios::put_scenario_handler),
        )
        .route("/lesson/chat", post(lesson::chat_handler))
        .route("/lesson/summary", post(lesson::summary_handler))
        .route("/speech-to-text", post(lesson::speech_to_text_handler))
        .route("/text-to-speech", post(lesson::text_to_speech_handler))
        .route("/progress/{learner}", get(progress::learning_summary_handler))
        .route("/progress/{learner}/report", get(progress::report_handler))
        .route(
            "/progress/{learner}/sessions",
            post(progress::record_session_handler),
        )
        .route(
            "/progress/{learner}/vocabulary",
            post(progress::record_vocabulary_handler),
        )
        .route("/progress/{learner}/level", put(progress::update_level_handler))
        .route(
            "/progress/{learner}/favorites/{kind}/{id}",
            put(progress::add_favorite_handler).delete(progress::remove_favorite_handler),
        )
        .route("/progress/{learner}/profile", put(progress::update_profile_handler))
        .route(
            "/progress/{learner}/recommendations",
            get(progress::recommendations_handler),
        )
        .route("/progress/{learner}/review", get(progress::review_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
