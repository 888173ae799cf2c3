use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::search_dto::*},
    error::AppError,
};

/// Fetch now and list every match, ignoring the seen-post store
pub async fn force_search(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let start_time = std::time::Instant::now();
    let found = state.poller.force_search().await?;
    debug!(
        "Force search returned {} matches in {}ms",
        found.len(),
        start_time.elapsed().as_millis()
    );

    let matches: Vec<ForcedMatchResponse> = found.into_iter().map(Into::into).collect();
    Ok(Json(ForceSearchResponse {
        total: matches.len(),
        matches,
    }))
}

/// Run one monitoring cycle now
pub async fn poll_now(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let report = state.poller.run_cycle().await?;
    Ok(Json(report))
}

pub async fn seen_count(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let count = state.seen.len()?;
    Ok(Json(SeenCountResponse { count }))
}

pub async fn reset_seen(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let forgotten = state.seen.reset()?;
    Ok(Json(SeenResetResponse { forgotten }))
}
