// Repository traits for dashboard persistence, chart data and credentials
use crate::domain::chart::{DeviceChartData, Granularity, HierarchyChartData};
use crate::domain::layout::{DashboardId, DashboardSummary, LayoutRow, PersistedLayout, WidgetId};
use async_trait::async_trait;

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// List the dashboards owned by the signed-in account
    async fn list_dashboards(&self, token: &str) -> anyhow::Result<Vec<DashboardSummary>>;

    /// Fetch every widget row of one dashboard
    async fn get_dashboard(&self, id: DashboardId, token: &str) -> anyhow::Result<Vec<LayoutRow>>;

    /// Replace the stored geometry of a dashboard with the full given set
    async fn bulk_update_layouts(
        &self,
        id: DashboardId,
        rows: &[PersistedLayout],
        token: &str,
    ) -> anyhow::Result<()>;

    /// Remove one widget from its dashboard
    async fn remove_widget(&self, id: WidgetId, token: &str) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ChartDataSource: Send + Sync {
    async fn device_chart_data(
        &self,
        device_id: i64,
        granularity: Granularity,
        token: &str,
    ) -> anyhow::Result<DeviceChartData>;

    async fn hierarchy_chart_data(
        &self,
        hierarchy_id: i64,
        granularity: Granularity,
        token: &str,
    ) -> anyhow::Result<HierarchyChartData>;
}

/// Supplies the session token; data operations are skipped without one.
pub trait CredentialSource: Send + Sync {
    fn token(&self) -> Option<String>;
}
