// Dashboard page - Composes dashboard selection, layout and refresh into one view
use crate::application::dashboard_repository::{ChartDataSource, CredentialSource, DashboardRepository};
use crate::application::layout_engine::DashboardLayoutEngine;
use crate::application::prop_deriver::AmbientContext;
use crate::application::refresh_orchestrator::{RefreshOrchestrator, RefreshState};
use crate::application::update_suppression::SeriesEquivalence;
use crate::application::widget_dispatcher::WidgetDispatcher;
use crate::application::widget_registry::WidgetRegistry;
use crate::domain::layout::{DashboardId, DashboardSummary, GeometryUpdate, WidgetId};
use crate::domain::selection::{Selection, TimeRange};
use crate::domain::view::{EditMode, PageView, TimeRangeOption};
use crate::domain::widget::ChartProps;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const NO_DASHBOARDS: &str = "No dashboards found. Create one to get started.";
pub const NO_DASHBOARD_SELECTED: &str = "Select a dashboard to view it";

#[derive(Debug, Clone, Copy)]
pub struct PageSettings {
    pub editable: bool,
    pub refresh_interval: Duration,
    pub default_time_range: TimeRange,
}

pub fn page_title(selection: Option<&Selection>) -> String {
    match selection {
        Some(Selection::Hierarchy(hierarchy)) => format!("{} Dashboard", hierarchy.name),
        Some(Selection::Device(device)) => match &device.serial_number {
            Some(serial) => format!("Device {} Dashboard", serial),
            None => format!("Device {} Dashboard", device.id),
        },
        None => "Production Dashboard".to_string(),
    }
}

pub struct DashboardPage {
    repository: Arc<dyn DashboardRepository>,
    credentials: Arc<dyn CredentialSource>,
    dispatcher: WidgetDispatcher,
    engine: DashboardLayoutEngine,
    orchestrator: RefreshOrchestrator,
    dashboards: Vec<DashboardSummary>,
}

impl DashboardPage {
    pub fn new(
        repository: Arc<dyn DashboardRepository>,
        chart_source: Arc<dyn ChartDataSource>,
        credentials: Arc<dyn CredentialSource>,
        registry: Arc<WidgetRegistry>,
        equivalence: Arc<dyn SeriesEquivalence>,
        settings: PageSettings,
    ) -> Self {
        Self {
            engine: DashboardLayoutEngine::new(
                Arc::clone(&repository),
                Arc::clone(&credentials),
                settings.editable,
            ),
            orchestrator: RefreshOrchestrator::new(
                chart_source,
                Arc::clone(&credentials),
                equivalence,
                settings.refresh_interval,
                settings.default_time_range,
            ),
            dispatcher: WidgetDispatcher::new(registry),
            repository,
            credentials,
            dashboards: Vec::new(),
        }
    }

    /// List the user's dashboards, open the first one and start polling.
    pub async fn mount(&mut self) {
        self.refresh_dashboards().await;
        if self.engine.dashboard_id().is_none() {
            if let Some(first) = self.dashboards.first().map(|d| d.id) {
                self.engine.switch_dashboard(first).await;
            }
        }
        self.orchestrator.start();
    }

    /// Stop polling and drop the open dashboard.
    pub fn unmount(&mut self) {
        self.orchestrator.stop();
        self.engine.unload();
    }

    pub async fn refresh_dashboards(&mut self) {
        let Some(token) = self.credentials.token() else {
            tracing::debug!("No credential, not listing dashboards");
            return;
        };
        match self.repository.list_dashboards(&token).await {
            Ok(dashboards) => {
                tracing::info!(count = dashboards.len(), "Loaded dashboards");
                self.dashboards = dashboards;
            }
            Err(e) => tracing::error!("Failed to list dashboards: {:#}", e),
        }
    }

    pub fn dashboards(&self) -> &[DashboardSummary] {
        &self.dashboards
    }

    /// Returns false when the id is not one of the listed dashboards.
    pub async fn select_dashboard(&mut self, dashboard_id: DashboardId) -> bool {
        if !self.dashboards.iter().any(|d| d.id == dashboard_id) {
            tracing::warn!(dashboard_id, "Unknown dashboard selected");
            return false;
        }
        self.engine.switch_dashboard(dashboard_id).await;
        true
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.orchestrator.set_selection(selection);
    }

    pub fn set_time_range(&mut self, time_range: TimeRange) {
        self.orchestrator.set_time_range(time_range);
    }

    pub async fn toggle_edit_mode(&mut self) -> EditMode {
        self.engine.toggle_edit_mode().await
    }

    pub fn update_layout(&mut self, updates: &[GeometryUpdate]) -> bool {
        self.engine.on_layout_mutate(updates)
    }

    pub async fn remove_widget(&mut self, widget_id: WidgetId) -> bool {
        self.engine.remove_widget(widget_id).await
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.orchestrator.subscribe()
    }

    pub async fn settle(&self) {
        self.orchestrator.settle().await;
    }

    pub fn ambient(&self, state: &RefreshState) -> AmbientContext {
        let selection = state.target.as_ref();
        AmbientContext {
            selected_device: selection.and_then(Selection::device).cloned(),
            selected_hierarchy: selection.and_then(Selection::hierarchy).cloned(),
            time_range: state.time_range,
            loading: self.engine.is_loading(),
            last_refresh: Some(state.last_refresh),
            metrics: state.metrics.clone(),
            flow_rate: state.flow_rate.clone(),
            generic: ChartProps::default(),
        }
    }

    pub fn render(&self) -> PageView {
        let state = self.orchestrator.snapshot();
        let selected_dashboard = self
            .engine
            .dashboard_id()
            .and_then(|id| self.dashboards.iter().find(|d| d.id == id))
            .cloned();

        let (dashboard, placeholder) = if selected_dashboard.is_some() {
            let ambient = self.ambient(&state);
            (Some(self.engine.render(&ambient, &self.dispatcher)), None)
        } else if self.dashboards.is_empty() {
            (None, Some(NO_DASHBOARDS.to_string()))
        } else {
            (None, Some(NO_DASHBOARD_SELECTED.to_string()))
        };

        PageView {
            title: page_title(state.target.as_ref()),
            loading: state.is_loading(),
            time_range: state.time_range,
            time_range_options: TimeRange::ALL
                .iter()
                .map(|range| TimeRangeOption {
                    value: *range,
                    label: range.label().to_string(),
                })
                .collect(),
            last_refresh: state.last_refresh,
            dashboards: self.dashboards.clone(),
            selected_dashboard,
            dashboard,
            placeholder,
        }
    }
}
