//! Read-side endpoints over the persisted state. The admin dashboard and
//! public site consume these rows; the endpoints here are the minimal
//! inspection surface.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};

pub async fn get_repo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state
        .store
        .get_repository(&id)?
        .or_not_found("Repository not found")?;

    Ok(Json(ApiResponse::success(repo)))
}

#[derive(Debug, Deserialize)]
pub struct SnapshotParams {
    pub period: Option<String>,
}

pub async fn list_repo_snapshots(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<SnapshotParams>,
) -> Result<axum::response::Response, ApiError> {
    let store = state.store.as_ref();
    store
        .get_repository(&id)?
        .or_not_found("Repository not found")?;

    let response = match params.period.as_deref().unwrap_or("daily") {
        "daily" => Json(ApiResponse::success(store.list_daily_snapshots(&id)?)).into_response(),
        "weekly" => Json(ApiResponse::success(store.list_weekly_snapshots(&id)?)).into_response(),
        "monthly" => Json(ApiResponse::success(store.list_monthly_snapshots(&id)?)).into_response(),
        other => {
            return Err(ApiError::bad_request(format!(
                "unknown snapshot period '{other}'"
            )));
        }
    };
    Ok(response)
}

pub async fn list_repo_apps(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let apps = state.store.list_apps_for_repo(&id)?;
    Ok(Json(ApiResponse::success(apps)))
}

pub async fn list_app_tags(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();
    store.get_app(&id)?.or_not_found("App not found")?;

    let tags = store.list_app_tags(&id)?;
    Ok(Json(ApiResponse::success(tags)))
}

pub async fn list_tags(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let tags = state.store.list_tags()?;
    Ok(Json(ApiResponse::success(tags)))
}
