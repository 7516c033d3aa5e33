// Chart data domain models
use serde::Serialize;
use serde_json::Value;

/// One time-series sample from a multiphase meter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: String,
    pub gfr: Option<f64>,
    pub gor: Option<f64>,
    pub gvf: Option<f64>,
    pub ofr: Option<f64>,
    pub wfr: Option<f64>,
    pub wlr: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
}

impl ChartPoint {
    /// Look up a measurement by its wire key (`gfr`, `ofr`, ...).
    pub fn field(&self, key: &str) -> Option<f64> {
        match key {
            "gfr" => self.gfr,
            "gor" => self.gor,
            "gvf" => self.gvf,
            "ofr" => self.ofr,
            "wfr" => self.wfr,
            "wlr" => self.wlr,
            "pressure" => self.pressure,
            "temperature" => self.temperature,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub id: String,
    pub serial_number: Option<String>,
    pub device_type: Option<String>,
    pub logo: Option<String>,
    pub metadata: Value,
    pub created_at: String,
    pub location: Option<String>,
    pub company: String,
    pub status: Option<String>,
}

impl DeviceInfo {
    pub fn is_offline(&self) -> bool {
        self.status.as_deref() == Some("Offline")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceChartData {
    pub device: DeviceInfo,
    pub chart_data: Vec<ChartPoint>,
    pub latest_data: Option<Value>,
    pub time_range: Option<Value>,
    pub total_data_points: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyChartData {
    pub hierarchy: Value,
    pub chart_data: Vec<ChartPoint>,
    pub latest_data: Option<Value>,
    pub time_range: Option<Value>,
    pub total_data_points: u64,
}

impl HierarchyChartData {
    pub fn name(&self) -> Option<&str> {
        self.hierarchy.get("name").and_then(Value::as_str)
    }
}

/// Bucket size requested from the chart endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}
