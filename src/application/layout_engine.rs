// Layout engine - Loads a dashboard's widgets and runs the view/edit cycle
use crate::application::dashboard_repository::{CredentialSource, DashboardRepository};
use crate::application::prop_deriver::{AmbientContext, derive_for_instance};
use crate::application::widget_dispatcher::WidgetDispatcher;
use crate::domain::layout::{DashboardId, GRID, GeometryUpdate, WidgetId, WidgetSet};
use crate::domain::view::{DashboardBody, DashboardView, EditMode, GridCell};
use std::sync::Arc;

pub const EMPTY_MESSAGE: &str = "No widgets added to this dashboard yet";
pub const EMPTY_HINT: &str = "Click \"Edit Layout\" to add widgets";
pub const EDIT_LABEL: &str = "Edit Layout";
pub const SAVE_LABEL: &str = "Save Changes";

pub struct DashboardLayoutEngine {
    repository: Arc<dyn DashboardRepository>,
    credentials: Arc<dyn CredentialSource>,
    editable: bool,
    dashboard_id: Option<DashboardId>,
    mode: EditMode,
    widgets: WidgetSet,
    has_changes: bool,
    loading: bool,
}

impl DashboardLayoutEngine {
    pub fn new(
        repository: Arc<dyn DashboardRepository>,
        credentials: Arc<dyn CredentialSource>,
        editable: bool,
    ) -> Self {
        Self {
            repository,
            credentials,
            editable,
            dashboard_id: None,
            mode: Self::initial_mode(editable),
            widgets: WidgetSet::default(),
            has_changes: false,
            loading: false,
        }
    }

    pub fn dashboard_id(&self) -> Option<DashboardId> {
        self.dashboard_id
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn widgets(&self) -> &WidgetSet {
        &self.widgets
    }

    /// Editable dashboards open unlocked.
    fn initial_mode(editable: bool) -> EditMode {
        if editable { EditMode::Edit } else { EditMode::View }
    }

    fn is_static(&self) -> bool {
        self.mode == EditMode::View
    }

    /// Fetch the dashboard and rebuild geometry and content from its rows.
    /// A failed fetch leaves whatever was loaded before, id included.
    pub async fn load(&mut self, dashboard_id: DashboardId) {
        let Some(token) = self.credentials.token() else {
            tracing::debug!(dashboard_id, "No credential, not loading dashboard");
            return;
        };

        self.loading = true;
        match self.repository.get_dashboard(dashboard_id, &token).await {
            Ok(rows) => match WidgetSet::from_rows(rows, self.is_static()) {
                Ok(widgets) => {
                    tracing::info!(dashboard_id, widgets = widgets.len(), "Loaded dashboard");
                    self.dashboard_id = Some(dashboard_id);
                    self.widgets = widgets;
                    self.has_changes = false;
                }
                Err(e) => tracing::error!(dashboard_id, "Rejected dashboard layout: {}", e),
            },
            Err(e) => tracing::error!(dashboard_id, "Failed to load dashboard: {:#}", e),
        }
        self.loading = false;
    }

    pub async fn reload(&mut self) {
        if let Some(id) = self.dashboard_id {
            self.load(id).await;
        }
    }

    /// Forget the loaded dashboard, including unsaved geometry.
    pub fn unload(&mut self) {
        self.dashboard_id = None;
        self.widgets = WidgetSet::default();
        self.has_changes = false;
        self.mode = Self::initial_mode(self.editable);
    }

    /// Discard the current dashboard entirely and load another one.
    pub async fn switch_dashboard(&mut self, dashboard_id: DashboardId) {
        if self.dashboard_id != Some(dashboard_id) {
            self.unload();
        }
        self.load(dashboard_id).await;
    }

    /// View -> Edit unlocks the grid. Edit -> View locks it again and
    /// persists pending geometry first; the switch happens even if that save
    /// fails.
    pub async fn toggle_edit_mode(&mut self) -> EditMode {
        if !self.editable {
            tracing::debug!("Dashboard is read-only, ignoring edit toggle");
            return self.mode;
        }

        match self.mode {
            EditMode::View => {
                self.mode = EditMode::Edit;
                self.widgets.set_static(false);
            }
            EditMode::Edit => {
                if self.has_changes {
                    self.save().await;
                }
                self.mode = EditMode::View;
                self.widgets.set_static(true);
            }
        }
        tracing::info!(mode = ?self.mode, "Edit mode toggled");
        self.mode
    }

    /// Take the grid's geometry. Ignored outside edit mode.
    pub fn on_layout_mutate(&mut self, updates: &[GeometryUpdate]) -> bool {
        if self.mode != EditMode::Edit {
            tracing::debug!("Ignoring layout change outside edit mode");
            return false;
        }
        self.widgets.apply_geometry(updates, self.is_static());
        self.has_changes = true;
        true
    }

    /// Persist the full geometry set. Returns true when the save succeeded.
    pub async fn save(&mut self) -> bool {
        let Some(dashboard_id) = self.dashboard_id else {
            return false;
        };
        let Some(token) = self.credentials.token() else {
            tracing::debug!(dashboard_id, "No credential, not saving layout");
            return false;
        };

        let rows = self.widgets.persisted_rows();
        match self
            .repository
            .bulk_update_layouts(dashboard_id, &rows, &token)
            .await
        {
            Ok(()) => {
                tracing::info!(dashboard_id, widgets = rows.len(), "Saved dashboard layout");
                self.has_changes = false;
                true
            }
            Err(e) => {
                tracing::error!(dashboard_id, "Failed to save dashboard layout: {:#}", e);
                false
            }
        }
    }

    /// Delete on the server first; local state only changes once that
    /// succeeds.
    pub async fn remove_widget(&mut self, widget_id: WidgetId) -> bool {
        let Some(token) = self.credentials.token() else {
            tracing::debug!(%widget_id, "No credential, not removing widget");
            return false;
        };

        match self.repository.remove_widget(widget_id, &token).await {
            Ok(()) => {
                self.widgets.remove(widget_id);
                tracing::info!(%widget_id, "Removed widget");
                true
            }
            Err(e) => {
                tracing::error!(%widget_id, "Failed to remove widget: {:#}", e);
                false
            }
        }
    }

    pub fn render(&self, ambient: &AmbientContext, dispatcher: &WidgetDispatcher) -> DashboardView {
        let body = if self.loading {
            DashboardBody::Loading
        } else if self.widgets.is_empty() {
            DashboardBody::Empty {
                message: EMPTY_MESSAGE.to_string(),
                hint: self.editable.then(|| EMPTY_HINT.to_string()),
            }
        } else {
            let removable = self.mode == EditMode::Edit;
            let cells = self
                .widgets
                .pairs()
                .map(|(entry, instance)| GridCell {
                    id: instance.id,
                    layout: entry.clone(),
                    removable,
                    widget: dispatcher
                        .render(&instance.component_name, &derive_for_instance(instance, ambient)),
                })
                .collect();
            DashboardBody::Grid { grid: GRID, cells }
        };

        let label = match self.mode {
            EditMode::Edit => SAVE_LABEL,
            EditMode::View => EDIT_LABEL,
        };
        let action_label = self.editable.then(|| label.to_string());

        DashboardView {
            mode: self.mode,
            editable: self.editable,
            action_label,
            has_changes: self.has_changes,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{FakeRepository, FixedToken, token};
    use crate::application::widget_registry::WidgetRegistry;
    use crate::domain::layout::fixtures::row;
    use crate::domain::view::RenderedWidget;
    use std::sync::atomic::Ordering;

    fn engine(repo: Arc<FakeRepository>) -> DashboardLayoutEngine {
        DashboardLayoutEngine::new(repo, Arc::new(token()), true)
    }

    fn dispatcher() -> WidgetDispatcher {
        WidgetDispatcher::new(Arc::new(WidgetRegistry::with_builtins()))
    }

    fn moved(id: i64, x: i32, y: i32) -> GeometryUpdate {
        GeometryUpdate {
            id: WidgetId(id),
            x,
            y,
            w: 4,
            h: 2,
            min_w: None,
            min_h: None,
        }
    }

    #[tokio::test]
    async fn test_editable_dashboard_loads_unlocked() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget"), row(2, "TableWidget")]));
        let mut engine = engine(repo);
        engine.load(1).await;

        assert_eq!(engine.mode(), EditMode::Edit);
        assert!(!engine.has_changes());
        assert!(engine.widgets().is_consistent());
        assert!(engine.widgets().entries().iter().all(|e| !e.is_static));
        let view = engine.render(&AmbientContext::default(), &dispatcher());
        assert_eq!(view.action_label.as_deref(), Some(SAVE_LABEL));
    }

    #[tokio::test]
    async fn test_read_only_dashboard_loads_locked() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget")]));
        let mut engine = DashboardLayoutEngine::new(repo, Arc::new(token()), false);
        engine.load(1).await;

        assert_eq!(engine.mode(), EditMode::View);
        assert!(engine.widgets().entries().iter().all(|e| e.is_static));
    }

    #[tokio::test]
    async fn test_toggle_without_changes_does_not_persist() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget")]));
        let mut engine = engine(repo.clone());
        engine.load(1).await;

        assert_eq!(engine.toggle_edit_mode().await, EditMode::View);
        assert!(engine.widgets().entries().iter().all(|e| e.is_static));
        assert_eq!(engine.toggle_edit_mode().await, EditMode::Edit);
        assert!(engine.widgets().entries().iter().all(|e| !e.is_static));
        assert_eq!(engine.toggle_edit_mode().await, EditMode::View);
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn test_drag_then_toggle_persists_once() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget"), row(2, "TableWidget")]));
        let mut engine = engine(repo.clone());
        engine.load(1).await;

        assert!(engine.on_layout_mutate(&[moved(1, 4, 0), moved(2, 0, 0)]));
        assert!(engine.has_changes());

        assert_eq!(engine.toggle_edit_mode().await, EditMode::View);
        assert_eq!(repo.save_count(), 1);
        assert!(!engine.has_changes());
        assert!(engine.widgets().entries().iter().all(|e| e.is_static));

        let (dashboard_id, rows) = repo.last_save().unwrap();
        assert_eq!(dashboard_id, 1);
        let first = rows.iter().find(|r| r.id == WidgetId(1)).unwrap();
        assert_eq!((first.x, first.y, first.display_order), (4, 0, 1));

        // Nothing pending, so saving again is a no-op.
        engine.toggle_edit_mode().await;
        engine.toggle_edit_mode().await;
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_mutate_ignored_in_view_mode() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget")]));
        let mut engine = engine(repo);
        engine.load(1).await;
        engine.toggle_edit_mode().await;

        assert!(!engine.on_layout_mutate(&[moved(1, 6, 6)]));
        assert!(!engine.has_changes());
        assert_eq!(engine.widgets().entry(WidgetId(1)).unwrap().x, 0);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_changes_but_leaves_edit_mode() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget")]));
        let mut engine = engine(repo.clone());
        engine.load(1).await;
        engine.on_layout_mutate(&[moved(1, 2, 2)]);

        repo.fail_save.store(true, Ordering::SeqCst);
        assert_eq!(engine.toggle_edit_mode().await, EditMode::View);
        assert!(engine.has_changes());

        repo.fail_save.store(false, Ordering::SeqCst);
        assert!(engine.save().await);
        assert!(!engine.has_changes());
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_waits_for_server() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget"), row(2, "TableWidget")]));
        let mut engine = engine(repo.clone());
        engine.load(1).await;

        repo.fail_remove.store(true, Ordering::SeqCst);
        assert!(!engine.remove_widget(WidgetId(1)).await);
        assert_eq!(engine.widgets().len(), 2);

        repo.fail_remove.store(false, Ordering::SeqCst);
        assert!(engine.remove_widget(WidgetId(1)).await);
        assert_eq!(engine.widgets().len(), 1);
        assert!(engine.widgets().entry(WidgetId(1)).is_none());
        assert!(engine.widgets().is_consistent());
        assert_eq!(*repo.removed.lock().unwrap(), vec![WidgetId(1)]);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_widgets() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget")]));
        let mut engine = engine(repo.clone());
        engine.load(1).await;

        repo.fail_get.store(true, Ordering::SeqCst);
        engine.reload().await;
        assert_eq!(engine.widgets().len(), 1);
        assert!(!engine.is_loading());
    }

    #[tokio::test]
    async fn test_no_credential_skips_everything() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget")]));
        let mut engine = DashboardLayoutEngine::new(repo.clone(), Arc::new(FixedToken(None)), true);
        engine.load(1).await;

        assert_eq!(repo.gets.load(Ordering::SeqCst), 0);
        assert!(engine.widgets().is_empty());
        assert!(!engine.save().await);
    }

    #[tokio::test]
    async fn test_read_only_dashboard_ignores_toggle() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget")]));
        let mut engine = DashboardLayoutEngine::new(repo, Arc::new(token()), false);
        engine.load(1).await;

        assert_eq!(engine.toggle_edit_mode().await, EditMode::View);
        let view = engine.render(&AmbientContext::default(), &dispatcher());
        assert!(view.action_label.is_none());
    }

    #[tokio::test]
    async fn test_render_empty_dashboard_placeholder() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![]));
        let mut engine = engine(repo);
        engine.load(1).await;

        let view = engine.render(&AmbientContext::default(), &dispatcher());
        assert_eq!(
            view.body,
            DashboardBody::Empty {
                message: EMPTY_MESSAGE.to_string(),
                hint: Some(EMPTY_HINT.to_string()),
            }
        );
        assert_eq!(view.action_label.as_deref(), Some(SAVE_LABEL));
    }

    #[tokio::test]
    async fn test_render_grid_cells_pair_by_id() {
        let repo = Arc::new(FakeRepository::with_dashboard(
            1,
            vec![row(1, "KPIWidget"), row(2, "NoSuchWidget")],
        ));
        let mut engine = engine(repo);
        engine.load(1).await;

        let view = engine.render(&AmbientContext::default(), &dispatcher());
        assert_eq!(view.action_label.as_deref(), Some(SAVE_LABEL));
        let DashboardBody::Grid { cells, .. } = view.body else {
            panic!("expected grid");
        };
        assert_eq!(cells.len(), 2);
        for cell in &cells {
            assert_eq!(cell.id, cell.layout.id);
            assert!(cell.removable);
        }
        assert!(matches!(cells[0].widget, RenderedWidget::Widget(_)));
        assert!(matches!(cells[1].widget, RenderedWidget::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_switch_dashboard_discards_previous_state() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget")]));
        repo.rows.lock().unwrap().insert(2, vec![row(5, "TableWidget"), row(6, "PieChartWidget")]);
        let mut engine = engine(repo);
        engine.load(1).await;
        engine.on_layout_mutate(&[moved(1, 3, 3)]);

        engine.switch_dashboard(2).await;
        assert_eq!(engine.dashboard_id(), Some(2));
        assert_eq!(engine.mode(), EditMode::Edit);
        assert!(!engine.has_changes());
        assert_eq!(engine.widgets().len(), 2);
        assert!(engine.widgets().instance(WidgetId(1)).is_none());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_dashboard() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget")]));
        let mut engine = engine(repo.clone());
        engine.load(1).await;
        engine.on_layout_mutate(&[moved(1, 4, 0)]);

        // Dashboard 2 does not exist.
        engine.load(2).await;
        assert_eq!(engine.dashboard_id(), Some(1));
        assert!(engine.has_changes());
        assert_eq!(engine.widgets().entry(WidgetId(1)).unwrap().x, 4);

        assert_eq!(engine.toggle_edit_mode().await, EditMode::View);
        let (dashboard_id, rows) = repo.last_save().unwrap();
        assert_eq!(dashboard_id, 1);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![WidgetId(1)]);
    }

    #[tokio::test]
    async fn test_repeated_save_sends_identical_payloads() {
        let repo = Arc::new(FakeRepository::with_dashboard(1, vec![row(1, "KPIWidget"), row(2, "TableWidget")]));
        let mut engine = engine(repo.clone());
        engine.load(1).await;
        engine.on_layout_mutate(&[moved(2, 4, 1)]);

        assert!(engine.save().await);
        assert!(engine.save().await);

        let saves = repo.saves.lock().unwrap();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0], saves[1]);
        let second = saves[1].1.iter().find(|r| r.id == WidgetId(2)).unwrap();
        assert_eq!((second.x, second.y, second.w, second.h, second.display_order), (4, 1, 4, 2, 2));
    }
}
