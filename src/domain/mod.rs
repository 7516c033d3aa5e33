// Domain layer - Dashboard, widget and chart models
pub mod chart;
pub mod layout;
pub mod selection;
pub mod view;
pub mod widget;
