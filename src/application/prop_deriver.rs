// Prop deriver - Routes the right chart payloads to each widget kind
use crate::domain::layout::WidgetInstance;
use crate::domain::selection::{DeviceRef, HierarchyRef, TimeRange};
use crate::domain::widget::{BaseProps, ChartProps, KindProps, WidgetKind, WidgetProps};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Page-level state every widget may draw from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmbientContext {
    pub selected_device: Option<DeviceRef>,
    pub selected_hierarchy: Option<HierarchyRef>,
    pub time_range: TimeRange,
    pub loading: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    /// Device and hierarchy metrics caches (fixed daily granularity).
    pub metrics: ChartProps,
    /// Device and hierarchy flow-rate caches (selected time range).
    pub flow_rate: ChartProps,
    /// Fallback payloads for kinds without a dedicated track.
    pub generic: ChartProps,
}

pub fn derive_props(
    component_name: &str,
    data_source_config: &Map<String, Value>,
    instance_config: &Map<String, Value>,
    ambient: &AmbientContext,
) -> WidgetProps {
    let mut config = data_source_config.clone();
    config.extend(instance_config.clone());

    let base = BaseProps {
        config,
        loading: ambient.loading,
        error: None,
        selected_device: ambient.selected_device.clone(),
        selected_hierarchy: ambient.selected_hierarchy.clone(),
        time_range: ambient.time_range,
    };

    let kind = WidgetKind::from_component_name(component_name);
    let data = match &kind {
        WidgetKind::MetricsCards => KindProps::MetricsCards {
            is_device_offline: ambient.metrics.is_device_offline(),
            data: ambient.metrics.clone(),
            last_refresh: ambient.last_refresh,
        },
        WidgetKind::FlowRateCharts => KindProps::FlowRateCharts {
            is_device_offline: ambient.flow_rate.is_device_offline(),
            data: ambient.flow_rate.clone(),
        },
        WidgetKind::FractionsChart => KindProps::FractionsChart {
            is_device_offline: ambient.metrics.is_device_offline(),
            data: ambient.metrics.clone(),
        },
        WidgetKind::GvfWlrCharts => KindProps::GvfWlrCharts {
            is_device_offline: ambient.metrics.is_device_offline(),
            data: ambient.metrics.clone(),
        },
        WidgetKind::ProductionMap => KindProps::ProductionMap,
        WidgetKind::AlarmsTable => KindProps::AlarmsTable,
        WidgetKind::Kpi
        | WidgetKind::LineChart
        | WidgetKind::PieChart
        | WidgetKind::Table
        | WidgetKind::Other(_) => KindProps::Generic {
            data: ambient.generic.clone(),
        },
    };

    WidgetProps { kind, base, data }
}

pub fn derive_for_instance(instance: &WidgetInstance, ambient: &AmbientContext) -> WidgetProps {
    derive_props(
        &instance.component_name,
        &instance.data_source_config,
        &instance.instance_config,
        ambient,
    )
}
