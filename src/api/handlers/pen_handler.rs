use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::pen_dto::*},
    error::AppError,
    services::Pagination,
};

const DEFAULT_SEARCH_LIMIT: usize = 5;

pub async fn list_pens(
    State(state): State<AppState>,
    Query(params): Query<ListPensParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!(
        "Listing pens: page={:?}, page_size={:?}",
        params.page, params.page_size
    );

    let defaults = Pagination::default();
    let pagination = Pagination::new(
        params.page.unwrap_or(defaults.page),
        params.page_size.unwrap_or(defaults.page_size),
    );
    let page = state.catalog.list_pens(pagination)?;

    Ok(Json(PenListResponse {
        pens: page.pens.into_iter().map(PenResponse::from).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

pub async fn create_pen(
    State(state): State<AppState>,
    Json(request): Json<CreatePenRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Adding pen: {}", request.formal_name);

    let added = state
        .catalog
        .add_pen(&request.formal_name, &request.aliases)?;
    state.observability.metrics.record_catalog_mutation();

    let response = CreatePenResponse {
        pen: added.entry.into(),
        total: added.total,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn search_pens(
    State(state): State<AppState>,
    Query(params): Query<SearchPensParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(AppError::Validation("Query cannot be empty".to_string()));
    }

    let matches = state
        .catalog
        .search(&query, params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT));
    debug!("Pen search '{}' returned {} matches", query, matches.len());

    Ok(Json(SearchPensResponse { query, matches }))
}

pub async fn reload_pens(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let report = state.catalog.reload_aliases()?;
    Ok(Json(report))
}

pub async fn delete_pen(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Removing pen matching '{}'", query);

    let removed = state.catalog.remove_pen(&query)?;
    state.observability.metrics.record_catalog_mutation();
    Ok(Json(removed))
}

pub async fn add_aliases(
    State(state): State<AppState>,
    Path(query): Path<String>,
    Json(request): Json<AliasesRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.aliases.is_empty() {
        return Err(AppError::Validation("aliases cannot be empty".to_string()));
    }

    let outcome = state.catalog.add_aliases(&query, &request.aliases)?;
    if !outcome.added.is_empty() {
        state.observability.metrics.record_catalog_mutation();
    }
    Ok(Json(outcome))
}

pub async fn remove_aliases(
    State(state): State<AppState>,
    Path(query): Path<String>,
    Json(request): Json<AliasesRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.aliases.is_empty() {
        return Err(AppError::Validation("aliases cannot be empty".to_string()));
    }

    let outcome = state.catalog.remove_aliases(&query, &request.aliases)?;
    if !outcome.removed.is_empty() {
        state.observability.metrics.record_catalog_mutation();
    }
    Ok(Json(outcome))
}
