// In-memory collaborators for application tests
use crate::application::dashboard_repository::{ChartDataSource, CredentialSource, DashboardRepository};
use crate::domain::chart::fixtures::{device_data, hierarchy_data, point};
use crate::domain::chart::{ChartPoint, DeviceChartData, Granularity, HierarchyChartData};
use crate::domain::layout::{DashboardId, DashboardSummary, LayoutRow, PersistedLayout, WidgetId};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub struct FixedToken(pub Option<String>);

impl CredentialSource for FixedToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

pub fn token() -> FixedToken {
    FixedToken(Some("token".to_string()))
}

#[derive(Default)]
pub struct FakeRepository {
    pub dashboards: Mutex<Vec<DashboardSummary>>,
    pub rows: Mutex<HashMap<DashboardId, Vec<LayoutRow>>>,
    pub saves: Mutex<Vec<(DashboardId, Vec<PersistedLayout>)>>,
    pub removed: Mutex<Vec<WidgetId>>,
    pub gets: AtomicUsize,
    pub fail_get: AtomicBool,
    pub fail_save: AtomicBool,
    pub fail_remove: AtomicBool,
    pub fail_list: AtomicBool,
}

impl FakeRepository {
    pub fn with_dashboard(id: DashboardId, rows: Vec<LayoutRow>) -> Self {
        let repo = Self::default();
        repo.dashboards.lock().unwrap().push(DashboardSummary {
            id,
            name: format!("Dashboard {id}"),
        });
        repo.rows.lock().unwrap().insert(id, rows);
        repo
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    pub fn last_save(&self) -> Option<(DashboardId, Vec<PersistedLayout>)> {
        self.saves.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl DashboardRepository for FakeRepository {
    async fn list_dashboards(&self, _token: &str) -> anyhow::Result<Vec<DashboardSummary>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(anyhow!("list failed"));
        }
        Ok(self.dashboards.lock().unwrap().clone())
    }

    async fn get_dashboard(&self, id: DashboardId, _token: &str) -> anyhow::Result<Vec<LayoutRow>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(anyhow!("get failed"));
        }
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("dashboard {id} not found"))
    }

    async fn bulk_update_layouts(
        &self,
        id: DashboardId,
        rows: &[PersistedLayout],
        _token: &str,
    ) -> anyhow::Result<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(anyhow!("save failed"));
        }
        self.saves.lock().unwrap().push((id, rows.to_vec()));
        Ok(())
    }

    async fn remove_widget(&self, id: WidgetId, _token: &str) -> anyhow::Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(anyhow!("remove failed"));
        }
        self.removed.lock().unwrap().push(id);
        Ok(())
    }
}

pub struct FakeChartSource {
    points: Mutex<Vec<ChartPoint>>,
    delays: Mutex<HashMap<i64, Duration>>,
    device_calls: Mutex<Vec<(i64, Granularity)>>,
    hierarchy_calls: Mutex<Vec<(i64, Granularity)>>,
    failing: AtomicBool,
}

impl FakeChartSource {
    pub fn new() -> Self {
        Self {
            points: Mutex::new(vec![point("2026-01-01T00:00:00Z", 100.0)]),
            delays: Mutex::new(HashMap::new()),
            device_calls: Mutex::new(Vec::new()),
            hierarchy_calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_points(&self, points: Vec<ChartPoint>) {
        *self.points.lock().unwrap() = points;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Responses for this id arrive after `delay`.
    pub fn delay_device(&self, id: i64, delay: Duration) {
        self.delays.lock().unwrap().insert(id, delay);
    }

    pub fn device_calls(&self) -> Vec<(i64, Granularity)> {
        self.device_calls.lock().unwrap().clone()
    }

    pub fn hierarchy_calls(&self) -> Vec<(i64, Granularity)> {
        self.hierarchy_calls.lock().unwrap().clone()
    }

    async fn respond(&self, id: i64) -> anyhow::Result<Vec<ChartPoint>> {
        let delay = self.delays.lock().unwrap().get(&id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("chart service unavailable"));
        }
        Ok(self.points.lock().unwrap().clone())
    }
}

#[async_trait]
impl ChartDataSource for FakeChartSource {
    async fn device_chart_data(
        &self,
        device_id: i64,
        granularity: Granularity,
        _token: &str,
    ) -> anyhow::Result<DeviceChartData> {
        self.device_calls.lock().unwrap().push((device_id, granularity));
        let points = self.respond(device_id).await?;
        Ok(device_data(device_id, "Online", points).as_ref().clone())
    }

    async fn hierarchy_chart_data(
        &self,
        hierarchy_id: i64,
        granularity: Granularity,
        _token: &str,
    ) -> anyhow::Result<HierarchyChartData> {
        self.hierarchy_calls.lock().unwrap().push((hierarchy_id, granularity));
        let points = self.respond(hierarchy_id).await?;
        Ok(hierarchy_data(hierarchy_id, points).as_ref().clone())
    }
}
