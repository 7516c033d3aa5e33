// Selection domain model - what the dashboard is scoped to
use super::chart::Granularity;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceRef {
    pub id: i64,
    #[serde(default)]
    pub serial_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HierarchyRef {
    pub id: i64,
    pub name: String,
}

/// Exactly one selection kind is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Device(DeviceRef),
    Hierarchy(HierarchyRef),
}

impl Selection {
    pub fn device(&self) -> Option<&DeviceRef> {
        match self {
            Selection::Device(device) => Some(device),
            Selection::Hierarchy(_) => None,
        }
    }

    pub fn hierarchy(&self) -> Option<&HierarchyRef> {
        match self {
            Selection::Hierarchy(hierarchy) => Some(hierarchy),
            Selection::Device(_) => None,
        }
    }

    /// Kind and id identify the target; serial and name are labels only.
    pub fn same_target(&self, other: &Selection) -> bool {
        match (self, other) {
            (Selection::Device(a), Selection::Device(b)) => a.id == b.id,
            (Selection::Hierarchy(a), Selection::Hierarchy(b)) => a.id == b.id,
            _ => false,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Device(d) => write!(f, "device {}", d.id),
            Selection::Hierarchy(h) => write!(f, "hierarchy {}", h.id),
        }
    }
}

/// User-facing time window for the flow-rate track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "1day")]
    OneDay,
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "1month")]
    OneMonth,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [TimeRange::OneDay, TimeRange::SevenDays, TimeRange::OneMonth];

    pub fn granularity(&self) -> Granularity {
        match self {
            TimeRange::OneDay => Granularity::Day,
            TimeRange::SevenDays => Granularity::Week,
            TimeRange::OneMonth => Granularity::Month,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "Today",
            TimeRange::SevenDays => "Last 7 Days",
            TimeRange::OneMonth => "Last 1 Month",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "1day",
            TimeRange::SevenDays => "7days",
            TimeRange::OneMonth => "1month",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_granularity() {
        assert_eq!(TimeRange::OneDay.granularity().as_str(), "day");
        assert_eq!(TimeRange::SevenDays.granularity().as_str(), "week");
        assert_eq!(TimeRange::OneMonth.granularity().as_str(), "month");
    }

    #[test]
    fn test_time_range_parse() {
        assert_eq!(TimeRange::parse("7days"), Some(TimeRange::SevenDays));
        assert_eq!(TimeRange::parse("1year"), None);
    }

    #[test]
    fn test_selection_wire_shape() {
        let selection: Selection =
            serde_json::from_str(r#"{"kind":"device","id":7,"serial_number":"MPFM-7"}"#).unwrap();
        assert_eq!(selection.device().map(|d| d.id), Some(7));
        assert!(selection.hierarchy().is_none());
    }

    #[test]
    fn test_same_target_ignores_labels() {
        let north = Selection::Hierarchy(HierarchyRef { id: 4, name: "North".to_string() });
        let renamed = Selection::Hierarchy(HierarchyRef { id: 4, name: "North Field".to_string() });
        let device = Selection::Device(DeviceRef { id: 4, serial_number: None });

        assert!(north.same_target(&renamed));
        assert_ne!(north, renamed);
        assert!(!north.same_target(&device));
    }
}
