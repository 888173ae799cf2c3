use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::monitoring_dto::*},
    error::AppError,
};

fn require_pens(request: &MonitoringRequest) -> Result<(), AppError> {
    if request.pens.iter().all(|p| p.trim().is_empty()) {
        return Err(AppError::Validation("pens cannot be empty".to_string()));
    }
    Ok(())
}

pub async fn show_monitoring(State(state): State<AppState>) -> impl IntoResponse {
    Json(MonitoringResponse {
        monitored: state.catalog.monitored(),
        search_terms: state.catalog.search_terms().into_iter().collect(),
    })
}

pub async fn add_monitoring(
    State(state): State<AppState>,
    Json(request): Json<MonitoringRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_pens(&request)?;
    debug!("Adding to monitoring: {:?}", request.pens);

    let outcome = state.catalog.add_monitoring(&request.pens)?;
    if !outcome.added.is_empty() {
        state.observability.metrics.record_catalog_mutation();
    }
    Ok(Json(outcome))
}

pub async fn remove_monitoring(
    State(state): State<AppState>,
    Json(request): Json<MonitoringRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_pens(&request)?;
    debug!("Removing from monitoring: {:?}", request.pens);

    let outcome = state.catalog.remove_monitoring(&request.pens)?;
    if !outcome.removed.is_empty() {
        state.observability.metrics.record_catalog_mutation();
    }
    Ok(Json(outcome))
}

pub async fn reload_monitoring(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.catalog.reload_monitoring()?;
    Ok(Json(report))
}
