// Widget kinds and the typed props each kind receives
use super::chart::{ChartPoint, DeviceChartData, HierarchyChartData};
use super::selection::{DeviceRef, HierarchyRef, TimeRange};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Known component names, with a catch-all for anything registered later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Kpi,
    LineChart,
    PieChart,
    Table,
    MetricsCards,
    FlowRateCharts,
    FractionsChart,
    GvfWlrCharts,
    ProductionMap,
    AlarmsTable,
    Other(String),
}

impl WidgetKind {
    pub const BUILT_IN: [WidgetKind; 10] = [
        WidgetKind::Kpi,
        WidgetKind::LineChart,
        WidgetKind::PieChart,
        WidgetKind::Table,
        WidgetKind::MetricsCards,
        WidgetKind::FlowRateCharts,
        WidgetKind::FractionsChart,
        WidgetKind::GvfWlrCharts,
        WidgetKind::ProductionMap,
        WidgetKind::AlarmsTable,
    ];

    pub fn from_component_name(name: &str) -> Self {
        match name {
            "KPIWidget" => WidgetKind::Kpi,
            "LineChartWidget" => WidgetKind::LineChart,
            "PieChartWidget" => WidgetKind::PieChart,
            "TableWidget" => WidgetKind::Table,
            "MetricsCards" => WidgetKind::MetricsCards,
            "FlowRateCharts" => WidgetKind::FlowRateCharts,
            "FractionsChart" => WidgetKind::FractionsChart,
            "GVFWLRCharts" => WidgetKind::GvfWlrCharts,
            "ProductionMap" => WidgetKind::ProductionMap,
            "AlarmsTableWidget" => WidgetKind::AlarmsTable,
            other => WidgetKind::Other(other.to_string()),
        }
    }

    pub fn component_name(&self) -> &str {
        match self {
            WidgetKind::Kpi => "KPIWidget",
            WidgetKind::LineChart => "LineChartWidget",
            WidgetKind::PieChart => "PieChartWidget",
            WidgetKind::Table => "TableWidget",
            WidgetKind::MetricsCards => "MetricsCards",
            WidgetKind::FlowRateCharts => "FlowRateCharts",
            WidgetKind::FractionsChart => "FractionsChart",
            WidgetKind::GvfWlrCharts => "GVFWLRCharts",
            WidgetKind::ProductionMap => "ProductionMap",
            WidgetKind::AlarmsTable => "AlarmsTableWidget",
            WidgetKind::Other(name) => name,
        }
    }
}

/// Props every widget receives regardless of kind.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseProps {
    pub config: Map<String, Value>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected_device: Option<DeviceRef>,
    pub selected_hierarchy: Option<HierarchyRef>,
    pub time_range: TimeRange,
}

impl BaseProps {
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<String> {
        self.config_str("title").map(str::to_string)
    }
}

/// Device and hierarchy payloads handed to a chart widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartProps {
    pub chart_data: Option<Arc<DeviceChartData>>,
    pub hierarchy_chart_data: Option<Arc<HierarchyChartData>>,
}

impl ChartProps {
    /// Points of whichever payload is present, device first.
    pub fn points(&self) -> &[ChartPoint] {
        if let Some(device) = &self.chart_data {
            return &device.chart_data;
        }
        if let Some(hierarchy) = &self.hierarchy_chart_data {
            return &hierarchy.chart_data;
        }
        &[]
    }

    pub fn latest(&self) -> Option<&ChartPoint> {
        self.points().last()
    }

    pub fn is_device_offline(&self) -> bool {
        self.chart_data
            .as_ref()
            .map(|data| data.device.is_offline())
            .unwrap_or(false)
    }
}

/// Kind-specific part of the prop contract.
#[derive(Debug, Clone, PartialEq)]
pub enum KindProps {
    MetricsCards {
        data: ChartProps,
        last_refresh: Option<DateTime<Utc>>,
        is_device_offline: bool,
    },
    FlowRateCharts {
        data: ChartProps,
        is_device_offline: bool,
    },
    FractionsChart {
        data: ChartProps,
        is_device_offline: bool,
    },
    GvfWlrCharts {
        data: ChartProps,
        is_device_offline: bool,
    },
    ProductionMap,
    AlarmsTable,
    Generic {
        data: ChartProps,
    },
}

impl KindProps {
    pub fn chart(&self) -> Option<&ChartProps> {
        match self {
            KindProps::MetricsCards { data, .. }
            | KindProps::FlowRateCharts { data, .. }
            | KindProps::FractionsChart { data, .. }
            | KindProps::GvfWlrCharts { data, .. }
            | KindProps::Generic { data } => Some(data),
            KindProps::ProductionMap | KindProps::AlarmsTable => None,
        }
    }

    pub fn is_device_offline(&self) -> bool {
        match self {
            KindProps::MetricsCards { is_device_offline, .. }
            | KindProps::FlowRateCharts { is_device_offline, .. }
            | KindProps::FractionsChart { is_device_offline, .. }
            | KindProps::GvfWlrCharts { is_device_offline, .. } => *is_device_offline,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetProps {
    pub kind: WidgetKind,
    pub base: BaseProps,
    pub data: KindProps,
}
