// Rendered view model - what the dashboard hands to whoever draws it
use super::layout::{DashboardSummary, GridSpec, LayoutEntry, WidgetId};
use super::selection::TimeRange;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesLine {
    pub data_key: String,
    pub name: String,
    pub color: Option<String>,
    /// (timestamp, value) pairs; gaps stay as `None`.
    pub points: Vec<(String, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub key: String,
    pub label: String,
    pub sortable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Absolute percentage, one decimal.
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub value: Option<f64>,
}

/// Content a widget unit produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetBody {
    Kpi {
        value: String,
        unit: Option<String>,
        trend: Option<Trend>,
    },
    Series {
        x_axis_key: String,
        lines: Vec<SeriesLine>,
        offline: bool,
    },
    Pie {
        slices: Vec<PieSlice>,
    },
    Table {
        columns: Vec<TableColumn>,
        rows: Vec<Value>,
        page: usize,
        total_pages: usize,
    },
    Cards {
        cards: Vec<MetricCard>,
        offline: bool,
        last_refresh: Option<DateTime<Utc>>,
    },
    Map {
        focus: Option<String>,
    },
    Notice {
        message: String,
    },
}

/// Tri-state body of the widget chrome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WidgetContent {
    Loading,
    Error { message: String },
    Ready { body: WidgetBody },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetChrome {
    pub title: Option<String>,
    pub content: WidgetContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "render", rename_all = "snake_case")]
pub enum RenderedWidget {
    Widget(WidgetChrome),
    NotFound {
        component_name: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub id: WidgetId,
    pub layout: LayoutEntry,
    pub removable: bool,
    pub widget: RenderedWidget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardBody {
    Loading,
    Empty {
        message: String,
        hint: Option<String>,
    },
    Grid {
        grid: GridSpec,
        cells: Vec<GridCell>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    View,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub mode: EditMode,
    pub editable: bool,
    /// Label of the mode toggle; absent when the dashboard is read-only.
    pub action_label: Option<String>,
    pub has_changes: bool,
    pub body: DashboardBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRangeOption {
    pub value: TimeRange,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub title: String,
    pub loading: bool,
    pub time_range: TimeRange,
    pub time_range_options: Vec<TimeRangeOption>,
    pub last_refresh: DateTime<Utc>,
    pub dashboards: Vec<DashboardSummary>,
    pub selected_dashboard: Option<DashboardSummary>,
    pub dashboard: Option<DashboardView>,
    /// Shown instead of a dashboard when none is selected.
    pub placeholder: Option<String>,
}
