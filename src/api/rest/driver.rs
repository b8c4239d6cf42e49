use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::dispatch::DispatchRecord;
use crate::models::store::Store;
use crate::state::AppState;
use crate::view::list::ListSnapshot;
use crate::view::segment::{PeriodSegment, StatusSegment};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/driver/dispatches", get(list_dispatches))
        .route("/driver/dispatches/:id/deliver", post(deliver))
        .route("/driver/dispatches/:id/reject", post(reject))
        .route("/driver/summary", get(summary))
        .route("/stores", get(stores))
}

#[derive(Deserialize)]
pub struct DispatchListParams {
    pub segment: Option<StatusSegment>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Deserialize)]
pub struct SummaryParams {
    pub period: Option<PeriodSegment>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct StoreParams {
    pub name: Option<String>,
}

async fn list_dispatches(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DispatchListParams>,
) -> Result<Json<ListSnapshot<DispatchRecord, StatusSegment>>, AppError> {
    let board = &state.driver_board;
    if params.refresh {
        board.load().await?;
    } else {
        board.ensure_loaded().await?;
    }
    if let Some(segment) = params.segment {
        board.select_segment(segment).await;
    }

    Ok(Json(board.snapshot().await))
}

async fn deliver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListSnapshot<DispatchRecord, StatusSegment>>, AppError> {
    state.driver_board.deliver(&id).await?;
    Ok(Json(state.driver_board.snapshot().await))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<RejectRequest>,
) -> Result<Json<ListSnapshot<DispatchRecord, StatusSegment>>, AppError> {
    state
        .driver_board
        .reject(&id, payload.reason.as_deref())
        .await?;
    Ok(Json(state.driver_board.snapshot().await))
}

async fn summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<ListSnapshot<DispatchRecord, PeriodSegment>>, AppError> {
    let summary = &state.driver_summary;
    if params.refresh {
        summary.load().await?;
    } else {
        summary.ensure_loaded().await?;
    }
    if let Some(period) = params.period {
        summary.select_period(period).await;
    }

    Ok(Json(summary.snapshot().await))
}

async fn stores(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StoreParams>,
) -> Result<Json<Vec<Store>>, AppError> {
    state.session.require_identity().await?;

    let stores = match params.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => state.directory.stores_named(name).await,
        _ => state.directory.stores().await,
    };
    stores.map(Json).map_err(|err| {
        state.notifier.danger(err.notice_text());
        err
    })
}
