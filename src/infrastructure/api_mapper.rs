// Mapper between the REST wire format and domain models
use crate::domain::chart::{ChartPoint, DeviceChartData, DeviceInfo, HierarchyChartData};
use crate::domain::layout::{LayoutRow, PersistedLayout, StoredGeometry, WidgetId};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `{success, data, message}` wrapper around every response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardDto {
    #[serde(default)]
    pub layouts: Vec<LayoutRowDto>,
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct LayoutConfigDto {
    #[serde(default, deserialize_with = "lenient_i32", skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32", skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32", skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32", skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    #[serde(
        rename = "minW",
        default,
        deserialize_with = "lenient_i32",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_w: Option<i32>,
    #[serde(
        rename = "minH",
        default,
        deserialize_with = "lenient_i32",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_h: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct LayoutRowDto {
    pub id: i64,
    #[serde(default, deserialize_with = "layout_config_or_unset")]
    pub layout_config: Option<LayoutConfigDto>,
    #[serde(default)]
    pub widget_definition_id: Option<i64>,
    #[serde(default)]
    pub widget_name: Option<String>,
    pub component_name: String,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub data_source_config: Map<String, Value>,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub instance_config: Map<String, Value>,
    #[serde(default)]
    pub display_order: Option<i32>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PersistedLayoutDto {
    pub id: i64,
    pub layout_config: LayoutConfigDto,
    pub display_order: i32,
}

#[derive(Debug, Serialize)]
pub struct BulkLayoutsDto {
    pub layouts: Vec<PersistedLayoutDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPointDto {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gfr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gor: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gvf: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ofr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wfr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wlr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDto {
    #[serde(default)]
    pub device_id: Option<Value>,
    #[serde(default)]
    pub device_serial: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_logo: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub well_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceChartDto {
    #[serde(default)]
    pub device: DeviceDto,
    #[serde(default)]
    pub chart_data: Vec<ChartPointDto>,
    #[serde(default)]
    pub latest_data: Option<Value>,
    #[serde(default)]
    pub time_range: Option<Value>,
    #[serde(default)]
    pub total_data_points: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyChartDto {
    #[serde(default)]
    pub hierarchy: Value,
    #[serde(default)]
    pub chart_data: Vec<ChartPointDto>,
    #[serde(default)]
    pub latest_data: Option<Value>,
    #[serde(default)]
    pub time_range: Option<Value>,
    #[serde(default)]
    pub total_data_points: Option<u64>,
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    // Stored configs are sometimes null or a JSON string.
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        Value::String(raw) => match serde_json::from_str(&raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    // Decimal columns arrive as strings.
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let grid_unit = |value: f64| value.is_finite().then(|| value.round() as i32);
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().and_then(grid_unit),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(grid_unit),
        _ => None,
    })
}

fn layout_config_or_unset<'de, D>(deserializer: D) -> Result<Option<LayoutConfigDto>, D::Error>
where
    D: Deserializer<'de>,
{
    // Anything unreadable falls back to default geometry.
    let value = match Value::deserialize(deserializer)? {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::Null),
        value => value,
    };
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

pub fn layout_row_from_dto(dto: LayoutRowDto) -> LayoutRow {
    let geometry = dto.layout_config.unwrap_or_default();
    LayoutRow {
        id: WidgetId(dto.id),
        geometry: StoredGeometry {
            x: geometry.x,
            y: geometry.y,
            w: geometry.w,
            h: geometry.h,
            min_w: geometry.min_w,
            min_h: geometry.min_h,
        },
        widget_definition_id: dto.widget_definition_id,
        widget_name: dto.widget_name.unwrap_or_else(|| dto.component_name.clone()),
        component_name: dto.component_name,
        data_source_config: dto.data_source_config,
        instance_config: dto.instance_config,
        display_order: dto.display_order.unwrap_or(0),
    }
}

pub fn persisted_layout_to_dto(row: &PersistedLayout) -> PersistedLayoutDto {
    PersistedLayoutDto {
        id: row.id.0,
        layout_config: LayoutConfigDto {
            x: Some(row.x),
            y: Some(row.y),
            w: Some(row.w),
            h: Some(row.h),
            min_w: Some(row.min_w),
            min_h: Some(row.min_h),
        },
        display_order: row.display_order,
    }
}

fn point_from_dto(dto: ChartPointDto) -> ChartPoint {
    ChartPoint {
        timestamp: dto.timestamp,
        gfr: dto.gfr,
        gor: dto.gor,
        gvf: dto.gvf,
        ofr: dto.ofr,
        wfr: dto.wfr,
        wlr: dto.wlr,
        pressure: dto.pressure,
        temperature: dto.temperature,
    }
}

/// `device_id` is the id that was requested, used when the payload omits it.
pub fn device_chart_from_dto(dto: DeviceChartDto, device_id: i64) -> DeviceChartData {
    let device = dto.device;
    let id = match device.device_id {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => device_id.to_string(),
    };
    let total = dto.total_data_points.unwrap_or(dto.chart_data.len() as u64);

    DeviceChartData {
        device: DeviceInfo {
            id,
            serial_number: device.device_serial,
            device_type: device.device_name,
            logo: device.device_logo,
            metadata: device.metadata,
            created_at: device
                .created_at
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
            location: device.well_name,
            company: device.company_name.unwrap_or_else(|| "Unknown".to_string()),
            status: device.status,
        },
        chart_data: dto.chart_data.into_iter().map(point_from_dto).collect(),
        latest_data: dto.latest_data,
        time_range: dto.time_range,
        total_data_points: total,
    }
}

pub fn hierarchy_chart_from_dto(dto: HierarchyChartDto) -> HierarchyChartData {
    let total = dto.total_data_points.unwrap_or(dto.chart_data.len() as u64);
    HierarchyChartData {
        hierarchy: dto.hierarchy,
        chart_data: dto.chart_data.into_iter().map(point_from_dto).collect(),
        latest_data: dto.latest_data,
        time_range: dto.time_range,
        total_data_points: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layout_row_mapping() {
        let dto: LayoutRowDto = serde_json::from_value(json!({
            "id": 12,
            "layout_config": {"x": 2, "y": 0, "w": 6, "minW": 3},
            "widget_definition_id": 4,
            "widget_name": "Oil rate",
            "component_name": "KPIWidget",
            "data_source_config": "{\"field\":\"ofr\"}",
            "instance_config": null,
            "display_order": 3
        }))
        .unwrap();
        let row = layout_row_from_dto(dto);

        assert_eq!(row.id, WidgetId(12));
        assert_eq!(row.geometry.x, Some(2));
        assert_eq!(row.geometry.h, None);
        assert_eq!(row.geometry.min_w, Some(3));
        assert_eq!(row.data_source_config["field"], "ofr");
        assert!(row.instance_config.is_empty());
        assert_eq!(row.display_order, 3);
    }

    #[test]
    fn test_loose_layout_config_falls_back_per_field() {
        let dto: DashboardDto = serde_json::from_value(json!({
            "layouts": [
                {
                    "id": 1,
                    "layout_config": "{\"x\": 2.0, \"y\": \"3\", \"w\": \"wide\", \"minH\": null}",
                    "component_name": "KPIWidget"
                },
                {"id": 2, "layout_config": "not json", "component_name": "TableWidget"},
                {"id": 3, "layout_config": [1, 2], "component_name": "PieChartWidget"}
            ]
        }))
        .unwrap();
        let rows: Vec<LayoutRow> = dto.layouts.into_iter().map(layout_row_from_dto).collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].geometry.x, Some(2));
        assert_eq!(rows[0].geometry.y, Some(3));
        assert_eq!(rows[0].geometry.w, None);
        assert_eq!(rows[0].geometry.min_h, None);
        assert_eq!(rows[1].geometry, StoredGeometry::default());
        assert_eq!(rows[2].geometry, StoredGeometry::default());
    }

    #[test]
    fn test_persisted_layout_wire_keys() {
        let row = PersistedLayout {
            id: WidgetId(5),
            x: 1,
            y: 2,
            w: 4,
            h: 2,
            min_w: 2,
            min_h: 1,
            display_order: 7,
        };
        let wire = serde_json::to_value(persisted_layout_to_dto(&row)).unwrap();
        assert_eq!(
            wire,
            json!({
                "id": 5,
                "layout_config": {"x": 1, "y": 2, "w": 4, "h": 2, "minW": 2, "minH": 1},
                "display_order": 7
            })
        );
    }

    #[test]
    fn test_device_chart_mapping() {
        let dto: DeviceChartDto = serde_json::from_value(json!({
            "device": {"deviceSerial": "MPFM-7", "deviceName": "MPFM", "wellName": "Well 3", "status": "Offline"},
            "chartData": [{"timestamp": "2026-01-01T00:00:00Z", "ofr": "812.5", "gvf": 61.2, "wlr": null}],
            "totalDataPoints": 1
        }))
        .unwrap();
        let data = device_chart_from_dto(dto, 7);

        assert_eq!(data.device.id, "7");
        assert_eq!(data.device.company, "Unknown");
        assert_eq!(data.device.location.as_deref(), Some("Well 3"));
        assert!(data.device.is_offline());
        assert_eq!(data.chart_data[0].ofr, Some(812.5));
        assert_eq!(data.chart_data[0].gvf, Some(61.2));
        assert_eq!(data.chart_data[0].wlr, None);
    }

    #[test]
    fn test_unsuccessful_envelope() {
        let envelope: Envelope<DashboardDto> =
            serde_json::from_value(json!({"success": false, "message": "forbidden"})).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("forbidden"));
    }
}
