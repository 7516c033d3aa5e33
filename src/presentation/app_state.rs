// Application state for HTTP handlers
use crate::application::dashboard_page::DashboardPage;
use crate::application::refresh_orchestrator::RefreshState;
use tokio::sync::{Mutex, watch};

pub struct AppState {
    pub page: Mutex<DashboardPage>,
    /// Refresh-state changes, independent of the page lock.
    pub refresh: watch::Receiver<RefreshState>,
}

impl AppState {
    pub fn new(page: DashboardPage) -> Self {
        let refresh = page.subscribe();
        Self {
            page: Mutex::new(page),
            refresh,
        }
    }
}
