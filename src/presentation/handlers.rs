// HTTP request handlers
use crate::domain::layout::{DashboardId, DashboardSummary, GeometryUpdate, WidgetId};
use crate::domain::selection::{Selection, TimeRange};
use crate::domain::view::PageView;
use crate::infrastructure::event_stream::{sse_response, view_updates};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    /// Absent or null clears the selection.
    #[serde(default)]
    pub selection: Option<Selection>,
}

#[derive(Debug, Deserialize)]
pub struct TimeRangeRequest {
    pub time_range: TimeRange,
}

#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    pub layout: Vec<GeometryUpdate>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Re-list the user's dashboards
pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> Json<Vec<DashboardSummary>> {
    let mut page = state.page.lock().await;
    page.refresh_dashboards().await;
    Json(page.dashboards().to_vec())
}

pub async fn select_dashboard(
    Path(id): Path<DashboardId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PageView>, StatusCode> {
    let mut page = state.page.lock().await;
    if !page.select_dashboard(id).await {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(page.render()))
}

pub async fn get_view(State(state): State<Arc<AppState>>) -> Json<PageView> {
    Json(state.page.lock().await.render())
}

/// One rendered view per refresh-state change
pub async fn stream_view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rx = state.refresh.clone();
    let render_state = Arc::clone(&state);
    let views = view_updates(rx, move || {
        let state = Arc::clone(&render_state);
        async move { state.page.lock().await.render() }
    });
    sse_response(views)
}

pub async fn put_selection(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectionRequest>,
) -> Json<PageView> {
    let mut page = state.page.lock().await;
    page.set_selection(request.selection);
    Json(page.render())
}

pub async fn put_time_range(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TimeRangeRequest>,
) -> Json<PageView> {
    let mut page = state.page.lock().await;
    page.set_time_range(request.time_range);
    Json(page.render())
}

pub async fn toggle_edit_mode(State(state): State<Arc<AppState>>) -> Json<PageView> {
    let mut page = state.page.lock().await;
    page.toggle_edit_mode().await;
    Json(page.render())
}

/// Geometry is only accepted in edit mode.
pub async fn put_layout(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LayoutRequest>,
) -> Result<Json<PageView>, StatusCode> {
    let mut page = state.page.lock().await;
    if !page.update_layout(&request.layout) {
        return Err(StatusCode::CONFLICT);
    }
    Ok(Json(page.render()))
}

pub async fn delete_widget(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PageView>, StatusCode> {
    let mut page = state.page.lock().await;
    if !page.remove_widget(WidgetId(id)).await {
        return Err(StatusCode::BAD_GATEWAY);
    }
    Ok(Json(page.render()))
}
