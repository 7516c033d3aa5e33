// Presentation layer - HTTP surface over the dashboard page
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    delete_widget, get_view, health_check, list_dashboards, put_layout, put_selection,
    put_time_range, select_dashboard, stream_view, toggle_edit_mode,
};
use axum::Router;
use axum::routing::{delete, get, post, put};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/:id/select", post(select_dashboard))
        .route("/view", get(get_view))
        .route("/view/stream", get(stream_view))
        .route("/selection", put(put_selection))
        .route("/time-range", put(put_time_range))
        .route("/edit-mode/toggle", post(toggle_edit_mode))
        .route("/layout", put(put_layout))
        .route("/widgets/:id", delete(delete_widget))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
