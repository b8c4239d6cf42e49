use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::account::UserRecord;
use crate::models::dispatch::NewDispatch;
use crate::models::driver::DriverProfile;
use crate::services::accounts::{RegisterAdmin, RegisterDriver};
use crate::services::directory::FormOptions;
use crate::services::dispatch::DispatchFilter;
use crate::state::AppState;
use crate::view::dashboard::DashboardSnapshot;
use crate::view::route_manager::RouteManagerSnapshot;
use crate::view::segment::PeriodSegment;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/dispatches", get(list_dispatches).post(create_dispatch))
        .route("/admin/dispatches/filters", delete(reset_filters))
        .route("/admin/dispatches/:id", delete(delete_dispatch))
        .route("/admin/options", get(options))
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/drivers", post(register_driver))
        .route("/admin/admins", post(register_admin))
}

#[derive(Deserialize)]
pub struct DashboardParams {
    pub view: Option<PeriodSegment>,
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub refresh: bool,
}

/// Without any filter parameter the active filter is kept; reset it through
/// `DELETE /admin/dispatches/filters`.
async fn list_dispatches(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DispatchFilter>,
) -> Result<Json<RouteManagerSnapshot>, AppError> {
    state.session.require_admin().await?;

    let manager = &state.route_manager;
    if filter == DispatchFilter::default() {
        manager.ensure_loaded().await?;
    } else {
        manager.apply_filters(filter).await?;
    }

    Ok(Json(manager.snapshot().await))
}

async fn reset_filters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RouteManagerSnapshot>, AppError> {
    state.session.require_admin().await?;

    state.route_manager.reset_filters().await?;
    Ok(Json(state.route_manager.snapshot().await))
}

async fn create_dispatch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewDispatch>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.session.require_admin().await?;

    let id = state.route_manager.create(payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn delete_dispatch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.session.require_admin().await?;

    state.route_manager.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn options(State(state): State<Arc<AppState>>) -> Result<Json<FormOptions>, AppError> {
    state.session.require_admin().await?;

    Ok(Json(state.route_manager.options().await?))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardSnapshot>, AppError> {
    state.session.require_admin().await?;

    let dashboard = &state.dashboard;
    if params.refresh {
        dashboard.load().await?;
    } else {
        dashboard.ensure_loaded().await?;
    }
    if let Some(view) = params.view {
        dashboard.select_view(view).await;
    }
    if params.more {
        dashboard.show_more().await;
    }

    Ok(Json(dashboard.snapshot().await))
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterDriver>,
) -> Result<(StatusCode, Json<DriverProfile>), AppError> {
    state.session.require_admin().await?;

    match state.accounts.register_driver(payload).await {
        Ok(profile) => {
            state.route_manager.forget_options().await;
            state.notifier.success("Driver registered");
            Ok((StatusCode::CREATED, Json(profile)))
        }
        Err(err) => {
            state.notifier.danger(err.notice_text());
            Err(err)
        }
    }
}

async fn register_admin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterAdmin>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    state.session.require_admin().await?;

    match state.accounts.register_admin(payload).await {
        Ok(user) => {
            state.notifier.success("Administrator registered");
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(err) => {
            state.notifier.danger(err.notice_text());
            Err(err)
        }
    }
}
