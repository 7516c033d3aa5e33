// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use widget_dashboard::application::dashboard_page::{DashboardPage, PageSettings};
use widget_dashboard::application::update_suppression::PointwiseEquivalence;
use widget_dashboard::application::widget_registry::WidgetRegistry;
use widget_dashboard::infrastructure::api_client::ApiClient;
use widget_dashboard::infrastructure::config::load_app_config;
use widget_dashboard::infrastructure::credentials::StaticCredentials;
use widget_dashboard::presentation::app_state::AppState;
use widget_dashboard::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_app_config().context("Failed to load configuration")?;

    // Infrastructure
    let api = Arc::new(ApiClient::new(config.api.base_url.clone(), config.api.timeout())?);
    let credentials = Arc::new(StaticCredentials::new(config.api.token.clone()));
    if config.api.token.is_none() {
        tracing::warn!("No API token configured; dashboards and chart data will not load");
    }

    // Application
    let registry = Arc::new(WidgetRegistry::with_builtins());
    tracing::info!(widgets = ?registry.component_names(), "Registered widget components");

    let mut page = DashboardPage::new(
        api.clone(),
        api,
        credentials,
        registry,
        Arc::new(PointwiseEquivalence::default()),
        PageSettings {
            editable: config.dashboard.editable,
            refresh_interval: config.refresh.interval(),
            default_time_range: config.dashboard.default_time_range,
        },
    );
    page.mount().await;

    // Presentation
    let state = Arc::new(AppState::new(page));
    let app = router(state);

    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_addr))?;
    tracing::info!(%addr, "Starting widget-dashboard service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
