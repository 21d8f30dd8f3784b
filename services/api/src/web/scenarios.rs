//! services/api/src/web/scenarios.rs
//!
//! Axum handlers for browsing and editing the scenario catalogue.

use crate::error::{ApiError, ErrorResponse};
use crate::web::protocol::{ScenarioDto, ScenarioQuery};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::info;
use tutor_core::domain::{Level, ScenarioRecord};
use uuid::Uuid;

/// List scenarios, optionally filtered by level and theme.
#[utoipa::path(
    get,
    path = "/scenarios",
    params(ScenarioQuery),
    responses(
        (status = 200, description = "Matching scenarios in catalogue order", body = [ScenarioDto]),
        (status = 400, description = "Unknown level", body = ErrorResponse)
    ),
    tag = "scenarios"
)]
pub async fn list_scenarios_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ScenarioQuery>,
) -> Result<Json<Vec<ScenarioDto>>, ApiError> {
    let level = query
        .level
        .as_deref()
        .filter(|l| !l.is_empty())
        .map(str::parse::<Level>)
        .transpose()
        .map_err(|e| ApiError::invalid_request(e.to_string()))?;
    let theme = query.theme.as_deref().filter(|t| !t.is_empty());

    let store = app_state.scenarios.read().await;
    let selected: Vec<&ScenarioRecord> = match (level, theme) {
        (Some(level), theme) => store
            .filter_by_level(level)
            .into_iter()
            .filter(|s| theme.map_or(true, |t| s.theme == t))
            .collect(),
        (None, Some(theme)) => store.filter_by_theme(theme),
        (None, None) => store.all().iter().collect(),
    };
    Ok(Json(selected.into_iter().map(ScenarioDto::from).collect()))
}

/// The distinct levels present in the catalogue.
#[utoipa::path(
    get,
    path = "/scenarios/levels",
    responses((status = 200, description = "Distinct levels", body = [String])),
    tag = "scenarios"
)]
pub async fn list_levels_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let store = app_state.scenarios.read().await;
    Json(
        store
            .list_levels()
            .into_iter()
            .map(|level| level.as_str().to_string())
            .collect(),
    )
}

/// The distinct themes present in the catalogue.
#[utoipa::path(
    get,
    path = "/scenarios/themes",
    responses((status = 200, description = "Distinct themes", body = [String])),
    tag = "scenarios"
)]
pub async fn list_themes_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(app_state.scenarios.read().await.list_themes())
}

#[utoipa::path(
    get,
    path = "/scenarios/{id}",
    params(("id" = String, Path, description = "Scenario id")),
    responses(
        (status = 200, description = "The scenario", body = ScenarioDto),
        (status = 404, description = "No such scenario", body = ErrorResponse)
    ),
    tag = "scenarios"
)]
pub async fn get_scenario_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ScenarioDto>, ApiError> {
    let store = app_state.scenarios.read().await;
    store
        .get(&id)
        .map(|scenario| Json(ScenarioDto::from(scenario)))
        .ok_or_else(|| ApiError::not_found(format!("Scenario '{id}' not found")))
}

/// Create or replace a scenario. The id in the path wins over the body.
#[utoipa::path(
    put,
    path = "/scenarios/{id}",
    params(("id" = String, Path, description = "Scenario id")),
    request_body = ScenarioDto,
    responses(
        (status = 200, description = "Stored scenario", body = ScenarioDto),
        (status = 400, description = "Invalid scenario", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "scenarios"
)]
pub async fn put_scenario_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ScenarioDto>,
) -> Result<Json<ScenarioDto>, ApiError> {
    let record = body.into_domain(id)?;
    app_state.scenarios.write().await.save(record.clone()).await?;
    info!(scenario_id = %record.id, "Scenario saved");
    Ok(Json(ScenarioDto::from(&record)))
}

/// Create a new scenario, generating an id when the body has none.
#[utoipa::path(
    post,
    path = "/scenarios",
    request_body = ScenarioDto,
    responses(
        (status = 201, description = "Created scenario", body = ScenarioDto),
        (status = 400, description = "Invalid scenario or id already taken", body = ErrorResponse)
    ),
    tag = "scenarios"
)]
pub async fn create_scenario_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<ScenarioDto>,
) -> Result<impl IntoResponse, ApiError> {
    let id = match body.id.trim() {
        "" => Uuid::new_v4().simple().to_string(),
        id => id.to_string(),
    };
    let record = body.into_domain(id)?;

    let mut store = app_state.scenarios.write().await;
    if store.get(&record.id).is_some() {
        return Err(ApiError::invalid_request(format!(
            "Scenario '{}' already exists",
            record.id
        )));
    }
    store.save(record.clone()).await?;
    info!(scenario_id = %record.id, "Scenario created");
    Ok((StatusCode::CREATED, Json(ScenarioDto::from(&record))))
}
