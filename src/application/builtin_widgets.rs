// Built-in widget units registered at startup
use crate::application::widget_registry::{WidgetRegistry, WidgetUnit};
use crate::domain::chart::ChartPoint;
use crate::domain::view::{
    MetricCard, PieSlice, SeriesLine, TableColumn, Trend, TrendDirection, WidgetBody,
};
use crate::domain::widget::{KindProps, WidgetKind, WidgetProps};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

const PIE_COLORS: [&str; 5] = ["#3b82f6", "#8b5cf6", "#ec4899", "#f59e0b", "#10b981"];
const DEFAULT_PAGE_SIZE: usize = 10;
const EMPTY_VALUE: &str = "--";

pub fn register_builtins(registry: &WidgetRegistry) {
    for kind in WidgetKind::BUILT_IN {
        let unit: Arc<dyn WidgetUnit> = match kind {
            WidgetKind::Kpi => Arc::new(KpiWidget),
            WidgetKind::LineChart => Arc::new(LineChartWidget),
            WidgetKind::PieChart => Arc::new(PieChartWidget),
            WidgetKind::Table => Arc::new(TableWidget),
            WidgetKind::MetricsCards => Arc::new(MetricsCards),
            WidgetKind::FlowRateCharts => Arc::new(FlowRateCharts),
            WidgetKind::FractionsChart => Arc::new(FractionsChart),
            WidgetKind::GvfWlrCharts => Arc::new(GvfWlrCharts),
            WidgetKind::ProductionMap => Arc::new(ProductionMap),
            WidgetKind::AlarmsTable => Arc::new(AlarmsTable),
            WidgetKind::Other(_) => continue,
        };
        registry.register(kind.component_name(), unit);
    }
}

pub struct KpiWidget;

impl WidgetUnit for KpiWidget {
    fn render(&self, props: &WidgetProps) -> WidgetBody {
        let config = &props.base.config;
        let format = props.base.config_str("format").unwrap_or("number");

        let value = match config.get("value") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Number(number)) => number
                .as_f64()
                .map(|v| format_kpi_value(v, format))
                .unwrap_or_else(|| EMPTY_VALUE.to_string()),
            _ => props
                .base
                .config_str("field")
                .and_then(|field| props.data.chart()?.latest()?.field(field))
                .map(|v| format_kpi_value(v, format))
                .unwrap_or_else(|| EMPTY_VALUE.to_string()),
        };

        let trend = config.get("trend").and_then(|trend| {
            let value = trend.get("value")?.as_f64()?;
            let direction = match trend.get("direction").and_then(Value::as_str) {
                Some("up") => TrendDirection::Up,
                Some("down") => TrendDirection::Down,
                _ => TrendDirection::Neutral,
            };
            Some(Trend {
                direction,
                display: format!("{:.1}%", value.abs()),
            })
        });

        WidgetBody::Kpi {
            value,
            unit: props.base.config_str("unit").filter(|u| !u.is_empty()).map(str::to_string),
            trend,
        }
    }
}

pub fn format_kpi_value(value: f64, format: &str) -> String {
    match format {
        "percentage" => format!("{:.1}%", value),
        "currency" => format!("${}", group_thousands(value)),
        _ => group_thousands(value),
    }
}

/// Thousands separators with at most three fraction digits.
pub fn group_thousands(value: f64) -> String {
    let rendered = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

fn series_lines(points: &[ChartPoint], specs: &[(&str, &str, Option<&str>)]) -> Vec<SeriesLine> {
    specs
        .iter()
        .map(|(data_key, name, color)| SeriesLine {
            data_key: data_key.to_string(),
            name: name.to_string(),
            color: color.map(str::to_string),
            points: points
                .iter()
                .map(|p| (p.timestamp.clone(), p.field(data_key)))
                .collect(),
        })
        .collect()
}

fn chart_points(props: &WidgetProps) -> &[ChartPoint] {
    props.data.chart().map(|chart| chart.points()).unwrap_or(&[])
}

pub struct LineChartWidget;

impl WidgetUnit for LineChartWidget {
    fn render(&self, props: &WidgetProps) -> WidgetBody {
        let specs: Vec<(String, String, Option<String>)> = props
            .base
            .config
            .get("lines")
            .and_then(Value::as_array)
            .map(|lines| {
                lines
                    .iter()
                    .filter_map(|line| {
                        let data_key = line.get("dataKey")?.as_str()?.to_string();
                        let name = line
                            .get("name")
                            .and_then(Value::as_str)
                            .unwrap_or(&data_key)
                            .to_string();
                        let color = line.get("color").and_then(Value::as_str).map(str::to_string);
                        Some((data_key, name, color))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let borrowed: Vec<(&str, &str, Option<&str>)> = specs
            .iter()
            .map(|(key, name, color)| (key.as_str(), name.as_str(), color.as_deref()))
            .collect();

        WidgetBody::Series {
            x_axis_key: props.base.config_str("xAxisKey").unwrap_or("timestamp").to_string(),
            lines: series_lines(chart_points(props), &borrowed),
            offline: props.data.is_device_offline(),
        }
    }
}

pub struct PieChartWidget;

impl WidgetUnit for PieChartWidget {
    fn render(&self, props: &WidgetProps) -> WidgetBody {
        let slices = props
            .base
            .config
            .get("data")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        Some((
                            entry.get("name")?.as_str()?.to_string(),
                            entry.get("value")?.as_f64()?,
                            entry.get("color").and_then(Value::as_str).map(str::to_string),
                        ))
                    })
                    .enumerate()
                    .map(|(index, (name, value, color))| PieSlice {
                        name,
                        value,
                        color: color.unwrap_or_else(|| PIE_COLORS[index % PIE_COLORS.len()].to_string()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        WidgetBody::Pie { slices }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Sort (stable) and cut one 1-based page. Returns the page rows, the page
/// actually shown and the page count.
pub fn paginate_rows(
    rows: &[Value],
    sort: Option<(&str, SortOrder)>,
    page: usize,
    page_size: usize,
) -> (Vec<Value>, usize, usize) {
    let page_size = page_size.max(1);
    let mut sorted: Vec<&Value> = rows.iter().collect();
    if let Some((key, order)) = sort {
        sorted.sort_by(|a, b| {
            let ordering = compare_cells(a.get(key), b.get(key));
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    let total_pages = rows.len().div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));
    let start = (page - 1) * page_size;
    let rows = sorted.into_iter().skip(start).take(page_size).cloned().collect();
    (rows, page, total_pages)
}

fn render_table(props: &WidgetProps, default_columns: &[(&str, &str)]) -> WidgetBody {
    let config = &props.base.config;
    let columns: Vec<TableColumn> = match config.get("columns").and_then(Value::as_array) {
        Some(columns) => columns
            .iter()
            .filter_map(|column| {
                let key = column.get("key")?.as_str()?.to_string();
                Some(TableColumn {
                    label: column
                        .get("label")
                        .and_then(Value::as_str)
                        .unwrap_or(&key)
                        .to_string(),
                    sortable: column.get("sortable").and_then(Value::as_bool).unwrap_or(false),
                    key,
                })
            })
            .collect(),
        None => default_columns
            .iter()
            .map(|(key, label)| TableColumn {
                key: key.to_string(),
                label: label.to_string(),
                sortable: true,
            })
            .collect(),
    };

    let rows = config
        .get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let sort_order = match props.base.config_str("sortOrder") {
        Some("desc") => SortOrder::Desc,
        _ => SortOrder::Asc,
    };
    let sort = props
        .base
        .config_str("sortKey")
        .filter(|key| columns.iter().any(|c| c.key == *key && c.sortable))
        .map(|key| (key, sort_order));
    let page = config.get("page").and_then(Value::as_u64).unwrap_or(1) as usize;
    let page_size = config
        .get("pageSize")
        .and_then(Value::as_u64)
        .map(|size| size as usize)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let (rows, page, total_pages) = paginate_rows(&rows, sort, page, page_size);
    WidgetBody::Table {
        columns,
        rows,
        page,
        total_pages,
    }
}

pub struct TableWidget;

impl WidgetUnit for TableWidget {
    fn render(&self, props: &WidgetProps) -> WidgetBody {
        render_table(props, &[])
    }
}

pub struct AlarmsTable;

impl WidgetUnit for AlarmsTable {
    fn title(&self, props: &WidgetProps) -> Option<String> {
        props.base.title().or_else(|| Some("Alarms".to_string()))
    }

    fn render(&self, props: &WidgetProps) -> WidgetBody {
        render_table(
            props,
            &[("timestamp", "Time"), ("severity", "Severity"), ("message", "Message")],
        )
    }
}

const METRIC_CARDS: [(&str, &str, &str); 7] = [
    ("ofr", "Oil Flow Rate", "bbl/d"),
    ("wfr", "Water Flow Rate", "bbl/d"),
    ("gfr", "Gas Flow Rate", "MSCF/d"),
    ("gvf", "GVF", "%"),
    ("wlr", "WLR", "%"),
    ("pressure", "Pressure", "psi"),
    ("temperature", "Temperature", "°F"),
];

pub struct MetricsCards;

impl WidgetUnit for MetricsCards {
    fn render(&self, props: &WidgetProps) -> WidgetBody {
        let latest = props.data.chart().and_then(|chart| chart.latest());
        let cards = METRIC_CARDS
            .iter()
            .map(|(key, label, unit)| MetricCard {
                key: key.to_string(),
                label: label.to_string(),
                unit: unit.to_string(),
                value: latest.and_then(|p| p.field(key)),
            })
            .collect();

        let last_refresh = match &props.data {
            KindProps::MetricsCards { last_refresh, .. } => *last_refresh,
            _ => None,
        };

        WidgetBody::Cards {
            cards,
            offline: props.data.is_device_offline(),
            last_refresh,
        }
    }
}

pub struct FlowRateCharts;

impl WidgetUnit for FlowRateCharts {
    fn title(&self, props: &WidgetProps) -> Option<String> {
        props.base.title().or_else(|| Some("Flow Rates".to_string()))
    }

    fn render(&self, props: &WidgetProps) -> WidgetBody {
        WidgetBody::Series {
            x_axis_key: "timestamp".to_string(),
            lines: series_lines(
                chart_points(props),
                &[
                    ("ofr", "Oil Flow Rate", Some("#10b981")),
                    ("wfr", "Water Flow Rate", Some("#3b82f6")),
                    ("gfr", "Gas Flow Rate", Some("#f59e0b")),
                ],
            ),
            offline: props.data.is_device_offline(),
        }
    }
}

pub struct GvfWlrCharts;

impl WidgetUnit for GvfWlrCharts {
    fn title(&self, props: &WidgetProps) -> Option<String> {
        props.base.title().or_else(|| Some("GVF / WLR".to_string()))
    }

    fn render(&self, props: &WidgetProps) -> WidgetBody {
        WidgetBody::Series {
            x_axis_key: "timestamp".to_string(),
            lines: series_lines(
                chart_points(props),
                &[("gvf", "GVF", Some("#8b5cf6")), ("wlr", "WLR", Some("#ec4899"))],
            ),
            offline: props.data.is_device_offline(),
        }
    }
}

/// Oil/water/gas share of the latest sample, derived from GVF and WLR
/// (both in percent).
pub fn phase_fractions(point: &ChartPoint) -> Option<[(&'static str, f64); 3]> {
    let gvf = (point.gvf? / 100.0).clamp(0.0, 1.0);
    let wlr = (point.wlr? / 100.0).clamp(0.0, 1.0);
    let liquid = 1.0 - gvf;
    Some([
        ("Oil", liquid * (1.0 - wlr) * 100.0),
        ("Water", liquid * wlr * 100.0),
        ("Gas", gvf * 100.0),
    ])
}

pub struct FractionsChart;

impl WidgetUnit for FractionsChart {
    fn title(&self, props: &WidgetProps) -> Option<String> {
        props.base.title().or_else(|| Some("Fractions".to_string()))
    }

    fn render(&self, props: &WidgetProps) -> WidgetBody {
        let slices = props
            .data
            .chart()
            .and_then(|chart| chart.latest())
            .and_then(phase_fractions)
            .map(|fractions| {
                fractions
                    .iter()
                    .zip(["#10b981", "#3b82f6", "#f59e0b"])
                    .map(|((name, value), color)| PieSlice {
                        name: name.to_string(),
                        value: *value,
                        color: color.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        WidgetBody::Pie { slices }
    }
}

pub struct ProductionMap;

impl WidgetUnit for ProductionMap {
    fn title(&self, props: &WidgetProps) -> Option<String> {
        props.base.title().or_else(|| Some("Production Map".to_string()))
    }

    fn render(&self, props: &WidgetProps) -> WidgetBody {
        let focus = match (&props.base.selected_hierarchy, &props.base.selected_device) {
            (Some(hierarchy), _) => Some(hierarchy.name.clone()),
            (None, Some(device)) => Some(
                device
                    .serial_number
                    .clone()
                    .unwrap_or_else(|| format!("Device {}", device.id)),
            ),
            (None, None) => None,
        };
        WidgetBody::Map { focus }
    }
}
