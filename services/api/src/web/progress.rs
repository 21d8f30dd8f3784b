//! services/api/src/web/progress.rs
//!
//! Axum handlers over one learner's progress. Each request loads the learner's record
//! fresh; mutations hold `AppState::progress_lock` from load to write.

use crate::error::{ApiError, ErrorResponse};
use crate::web::protocol::{
    CountQuery, IdListResponse, LearningSummaryDto, LevelUpdateRequest, ProfileRequest,
    RecordSessionRequest, ReportResponse, VocabularyResultRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::info;
use tutor_core::analysis::build_report;
use tutor_core::domain::{is_valid_scenario_id, FavoriteKind, ProgressRecord};

const DEFAULT_RECOMMENDATION_COUNT: usize = 3;
const DEFAULT_REVIEW_COUNT: usize = 10;

fn check_learner_id(learner_id: &str) -> Result<(), ApiError> {
    if is_valid_scenario_id(learner_id) {
        Ok(())
    } else {
        Err(ApiError::invalid_request(format!(
            "Learner id '{learner_id}' may only contain ASCII letters, digits, '-' and '_'"
        )))
    }
}

/// The learner's summary counters and current level.
#[utoipa::path(
    get,
    path = "/progress/{learner}",
    params(("learner" = String, Path, description = "Learner id")),
    responses(
        (status = 200, description = "Learning summary", body = LearningSummaryDto),
        (status = 400, description = "Invalid learner id", body = ErrorResponse)
    ),
    tag = "progress"
)]
pub async fn learning_summary_handler(
    State(app_state): State<Arc<AppState>>,
    Path(learner): Path<String>,
) -> Result<Json<LearningSummaryDto>, ApiError> {
    check_learner_id(&learner)?;
    let store = app_state.open_progress(&learner).await?;
    Ok(Json(LearningSummaryDto::new(
        store.learner_id(),
        &store.get_learning_summary(),
    )))
}

/// Summary, session and vocabulary analyses, and study advice.
#[utoipa::path(
    get,
    path = "/progress/{learner}/report",
    params(("learner" = String, Path, description = "Learner id")),
    responses(
        (status = 200, description = "Learning report", body = ReportResponse),
        (status = 400, description = "Invalid learner id", body = ErrorResponse)
    ),
    tag = "progress"
)]
pub async fn report_handler(
    State(app_state): State<Arc<AppState>>,
    Path(learner): Path<String>,
) -> Result<Json<ReportResponse>, ApiError> {
    check_learner_id(&learner)?;
    let store = app_state.open_progress(&learner).await?;
    let report = build_report(store.record());
    Ok(Json(ReportResponse::new(store.learner_id(), &report)))
}

#[utoipa::path(
    post,
    path = "/progress/{learner}/sessions",
    params(("learner" = String, Path, description = "Learner id")),
    request_body = RecordSessionRequest,
    responses(
        (status = 201, description = "Session recorded", body = LearningSummaryDto),
        (status = 400, description = "Accuracy outside [0, 1] or empty scenario id", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "progress"
)]
pub async fn record_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(learner): Path<String>,
    Json(request): Json<RecordSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_learner_id(&learner)?;
    if request.scenario_id.trim().is_empty() {
        return Err(ApiError::invalid_request("scenario_id must not be empty"));
    }

    let _guard = app_state.progress_lock.lock().await;
    let mut store = app_state.open_progress(&learner).await?;
    store
        .record_session(
            &request.scenario_id,
            request.duration_minutes,
            request.conversation_turns,
            request.accuracy_rate,
        )
        .await?;
    info!(learner_id = %learner, scenario_id = %request.scenario_id, "Session recorded");

    let summary = LearningSummaryDto::new(store.learner_id(), &store.get_learning_summary());
    Ok((StatusCode::CREATED, Json(summary)))
}

#[utoipa::path(
    post,
    path = "/progress/{learner}/vocabulary",
    params(("learner" = String, Path, description = "Learner id")),
    request_body = VocabularyResultRequest,
    responses(
        (status = 204, description = "Result recorded"),
        (status = 400, description = "Empty term", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "progress"
)]
pub async fn record_vocabulary_handler(
    State(app_state): State<Arc<AppState>>,
    Path(learner): Path<String>,
    Json(request): Json<VocabularyResultRequest>,
) -> Result<StatusCode, ApiError> {
    check_learner_id(&learner)?;
    let term = request.term.trim();
    if term.is_empty() {
        return Err(ApiError::invalid_request("term must not be empty"));
    }

    let _guard = app_state.progress_lock.lock().await;
    let mut store = app_state.open_progress(&learner).await?;
    store.record_vocabulary_progress(term, request.correct).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/progress/{learner}/level",
    params(("learner" = String, Path, description = "Learner id")),
    request_body = LevelUpdateRequest,
    responses(
        (status = 204, description = "Level updated"),
        (status = 400, description = "Unknown category or level", body = ErrorResponse)
    ),
    tag = "progress"
)]
pub async fn update_level_handler(
    State(app_state): State<Arc<AppState>>,
    Path(learner): Path<String>,
    Json(request): Json<LevelUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    check_learner_id(&learner)?;
    let _guard = app_state.progress_lock.lock().await;
    let mut store = app_state.open_progress(&learner).await?;
    if store
        .update_level_assessment(&request.category, &request.level)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::invalid_request(format!(
            "Unknown assessment category '{}' or level '{}'",
            request.category, request.level
        )))
    }
}

/// Add an id to one of the favorites sets; responds with the resulting set.
#[utoipa::path(
    put,
    path = "/progress/{learner}/favorites/{kind}/{id}",
    params(
        ("learner" = String, Path, description = "Learner id"),
        ("kind" = String, Path, description = "`scenarios`, `phrases` or `vocabulary`"),
        ("id" = String, Path, description = "Item to add")
    ),
    responses(
        (status = 200, description = "The favorites set", body = IdListResponse),
        (status = 400, description = "Unknown kind", body = ErrorResponse)
    ),
    tag = "progress"
)]
pub async fn add_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Path((learner, kind, id)): Path<(String, String, String)>,
) -> Result<Json<IdListResponse>, ApiError> {
    check_learner_id(&learner)?;
    let _guard = app_state.progress_lock.lock().await;
    let mut store = app_state.open_progress(&learner).await?;
    if !store.add_to_favorites(&kind, &id).await? {
        return Err(unknown_kind(&kind));
    }
    favorites_response(store.record(), &kind)
}

/// Remove an id from one of the favorites sets; responds with the resulting set.
#[utoipa::path(
    delete,
    path = "/progress/{learner}/favorites/{kind}/{id}",
    params(
        ("learner" = String, Path, description = "Learner id"),
        ("kind" = String, Path, description = "`scenarios`, `phrases` or `vocabulary`"),
        ("id" = String, Path, description = "Item to remove")
    ),
    responses(
        (status = 200, description = "The favorites set", body = IdListResponse),
        (status = 400, description = "Unknown kind", body = ErrorResponse)
    ),
    tag = "progress"
)]
pub async fn remove_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Path((learner, kind, id)): Path<(String, String, String)>,
) -> Result<Json<IdListResponse>, ApiError> {
    check_learner_id(&learner)?;
    let _guard = app_state.progress_lock.lock().await;
    let mut store = app_state.open_progress(&learner).await?;
    if !store.remove_from_favorites(&kind, &id).await? {
        return Err(unknown_kind(&kind));
    }
    favorites_response(store.record(), &kind)
}

fn unknown_kind(kind: &str) -> ApiError {
    ApiError::invalid_request(format!("Unknown favorites kind '{kind}'"))
}

fn favorites_response(
    record: &ProgressRecord,
    kind: &str,
) -> Result<Json<IdListResponse>, ApiError> {
    let kind = kind.parse::<FavoriteKind>().map_err(|_| unknown_kind(kind))?;
    Ok(Json(IdListResponse {
        items: record.favorites.get(kind).to_vec(),
    }))
}

/// Replace the learner's strengths and weaknesses.
#[utoipa::path(
    put,
    path = "/progress/{learner}/profile",
    params(("learner" = String, Path, description = "Learner id")),
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated summary", body = LearningSummaryDto),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "progress"
)]
pub async fn update_profile_handler(
    State(app_state): State<Arc<AppState>>,
    Path(learner): Path<String>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<LearningSummaryDto>, ApiError> {
    check_learner_id(&learner)?;
    let _guard = app_state.progress_lock.lock().await;
    let mut store = app_state.open_progress(&learner).await?;
    store
        .update_strengths_weaknesses(request.strengths, request.weaknesses)
        .await?;
    Ok(Json(LearningSummaryDto::new(
        store.learner_id(),
        &store.get_learning_summary(),
    )))
}

/// Scenario ids to practise next, unseen scenarios first.
#[utoipa::path(
    get,
    path = "/progress/{learner}/recommendations",
    params(("learner" = String, Path, description = "Learner id"), CountQuery),
    responses((status = 200, description = "Recommended scenario ids", body = IdListResponse)),
    tag = "progress"
)]
pub async fn recommendations_handler(
    State(app_state): State<Arc<AppState>>,
    Path(learner): Path<String>,
    Query(query): Query<CountQuery>,
) -> Result<Json<IdListResponse>, ApiError> {
    check_learner_id(&learner)?;
    let candidates = app_state.scenarios.read().await.ids();
    let store = app_state.open_progress(&learner).await?;
    let count = query.count.unwrap_or(DEFAULT_RECOMMENDATION_COUNT);
    Ok(Json(IdListResponse {
        items: store.get_recommended_scenarios(&candidates, count),
    }))
}

/// Vocabulary terms to review, least accurate first.
#[utoipa::path(
    get,
    path = "/progress/{learner}/review",
    params(("learner" = String, Path, description = "Learner id"), CountQuery),
    responses((status = 200, description = "Terms to review", body = IdListResponse)),
    tag = "progress"
)]
pub async fn review_handler(
    State(app_state): State<Arc<AppState>>,
    Path(learner): Path<String>,
    Query(query): Query<CountQuery>,
) -> Result<Json<IdListResponse>, ApiError> {
    check_learner_id(&learner)?;
    let store = app_state.open_progress(&learner).await?;
    let count = query.count.unwrap_or(DEFAULT_REVIEW_COUNT);
    Ok(Json(IdListResponse {
        items: store.get_vocabulary_for_review(count),
    }))
}
