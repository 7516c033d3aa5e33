// Application layer - Widget resolution, layout editing and refresh orchestration
pub mod builtin_widgets;
pub mod dashboard_page;
pub mod dashboard_repository;
pub mod layout_engine;
pub mod prop_deriver;
pub mod refresh_orchestrator;
pub mod update_suppression;
pub mod widget_dispatcher;
pub mod widget_registry;
pub mod widget_wrapper;

#[cfg(test)]
pub(crate) mod test_support;
