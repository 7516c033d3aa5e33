// Layout domain model - grid geometry joined with widget content by id
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub type DashboardId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(pub i64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const DEFAULT_X: i32 = 0;
pub const DEFAULT_Y: i32 = 0;
pub const DEFAULT_W: i32 = 4;
pub const DEFAULT_H: i32 = 2;
pub const DEFAULT_MIN_W: i32 = 2;
pub const DEFAULT_MIN_H: i32 = 1;

/// Fixed responsive grid the dashboard is laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSpec {
    /// (name, min width px, columns), widest first.
    pub breakpoints: [(&'static str, u32, u32); 5],
    pub row_height: u32,
    pub margin: [u32; 2],
}

pub const GRID: GridSpec = GridSpec {
    breakpoints: [
        ("lg", 1200, 12),
        ("md", 996, 10),
        ("sm", 768, 6),
        ("xs", 480, 4),
        ("xxs", 0, 2),
    ],
    row_height: 100,
    margin: [16, 16],
};

impl GridSpec {
    /// Column count for a container width.
    pub fn columns_for_width(&self, width: u32) -> u32 {
        self.breakpoints
            .iter()
            .find(|(_, min_width, _)| width >= *min_width)
            .map(|(_, _, cols)| *cols)
            .unwrap_or(self.breakpoints[self.breakpoints.len() - 1].2)
    }
}

/// One grid placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    pub id: WidgetId,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub min_w: i32,
    pub min_h: i32,
    /// Derived from edit mode, never persisted.
    #[serde(rename = "static")]
    pub is_static: bool,
}

/// Content binding for one widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetInstance {
    pub id: WidgetId,
    pub widget_definition_id: Option<i64>,
    pub name: String,
    pub component_name: String,
    pub data_source_config: Map<String, Value>,
    pub instance_config: Map<String, Value>,
    pub display_order: i32,
}

impl WidgetInstance {
    /// Data-source keys overlaid by instance keys.
    pub fn merged_config(&self) -> Map<String, Value> {
        let mut config = self.data_source_config.clone();
        config.extend(self.instance_config.clone());
        config
    }
}

/// Geometry as stored on the server; any field may be unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredGeometry {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub w: Option<i32>,
    pub h: Option<i32>,
    pub min_w: Option<i32>,
    pub min_h: Option<i32>,
}

/// One dashboard row as returned by the persistence service.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRow {
    pub id: WidgetId,
    pub geometry: StoredGeometry,
    pub widget_definition_id: Option<i64>,
    pub widget_name: String,
    pub component_name: String,
    pub data_source_config: Map<String, Value>,
    pub instance_config: Map<String, Value>,
    pub display_order: i32,
}

/// One row of a bulk layout save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedLayout {
    pub id: WidgetId,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub min_w: i32,
    pub min_h: i32,
    pub display_order: i32,
}

/// Geometry reported by the grid after a drag or resize.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryUpdate {
    pub id: WidgetId,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    #[serde(default)]
    pub min_w: Option<i32>,
    #[serde(default)]
    pub min_h: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub id: DashboardId,
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("duplicate widget id {0} in dashboard layout")]
    DuplicateWidget(WidgetId),
}

// Zero is treated as unset for sizes, matching how the grid stores blanks.
fn positive_or(value: Option<i32>, default: i32) -> i32 {
    value.filter(|v| *v > 0).unwrap_or(default)
}

/// Geometry and content for every widget on a dashboard, kept id-consistent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetSet {
    entries: Vec<LayoutEntry>,
    instances: Vec<WidgetInstance>,
}

impl WidgetSet {
    pub fn from_rows(rows: Vec<LayoutRow>, is_static: bool) -> Result<Self, LayoutError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(rows.len());
        let mut instances = Vec::with_capacity(rows.len());

        for row in rows {
            if !seen.insert(row.id) {
                return Err(LayoutError::DuplicateWidget(row.id));
            }

            entries.push(LayoutEntry {
                id: row.id,
                x: row.geometry.x.unwrap_or(DEFAULT_X),
                y: row.geometry.y.unwrap_or(DEFAULT_Y),
                w: positive_or(row.geometry.w, DEFAULT_W),
                h: positive_or(row.geometry.h, DEFAULT_H),
                min_w: positive_or(row.geometry.min_w, DEFAULT_MIN_W),
                min_h: positive_or(row.geometry.min_h, DEFAULT_MIN_H),
                is_static,
            });
            instances.push(WidgetInstance {
                id: row.id,
                widget_definition_id: row.widget_definition_id,
                name: row.widget_name,
                component_name: row.component_name,
                data_source_config: row.data_source_config,
                instance_config: row.instance_config,
                display_order: row.display_order,
            });
        }

        Ok(Self { entries, instances })
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn instances(&self) -> &[WidgetInstance] {
        &self.instances
    }

    pub fn entry(&self, id: WidgetId) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn instance(&self, id: WidgetId) -> Option<&WidgetInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// Widgets in content order, each with its placement.
    pub fn pairs(&self) -> impl Iterator<Item = (&LayoutEntry, &WidgetInstance)> + '_ {
        self.instances
            .iter()
            .filter_map(|instance| self.entry(instance.id).map(|entry| (entry, instance)))
    }

    pub fn set_static(&mut self, is_static: bool) {
        for entry in &mut self.entries {
            entry.is_static = is_static;
        }
    }

    /// Replace geometry with what the grid reported. Unknown ids are dropped and
    /// widgets the grid left out keep their previous placement.
    pub fn apply_geometry(&mut self, updates: &[GeometryUpdate], is_static: bool) {
        let mut placed = HashSet::new();
        let mut entries = Vec::with_capacity(self.entries.len());

        for update in updates {
            let Some(previous) = self.entry(update.id) else {
                tracing::warn!(widget_id = %update.id, "Ignoring geometry for unknown widget");
                continue;
            };
            if !placed.insert(update.id) {
                continue;
            }
            entries.push(LayoutEntry {
                id: update.id,
                x: update.x,
                y: update.y,
                w: update.w,
                h: update.h,
                min_w: update.min_w.unwrap_or(previous.min_w),
                min_h: update.min_h.unwrap_or(previous.min_h),
                is_static,
            });
        }

        for previous in &self.entries {
            if !placed.contains(&previous.id) {
                entries.push(LayoutEntry {
                    is_static,
                    ..previous.clone()
                });
            }
        }

        self.entries = entries;
        debug_assert!(self.is_consistent());
    }

    /// Drop a widget's placement and content together.
    pub fn remove(&mut self, id: WidgetId) -> bool {
        let before = self.instances.len();
        self.entries.retain(|e| e.id != id);
        self.instances.retain(|i| i.id != id);
        debug_assert!(self.is_consistent());
        self.instances.len() != before
    }

    /// Full replacement payload for a bulk save, in grid order.
    pub fn persisted_rows(&self) -> Vec<PersistedLayout> {
        self.entries
            .iter()
            .map(|entry| PersistedLayout {
                id: entry.id,
                x: entry.x,
                y: entry.y,
                w: entry.w,
                h: entry.h,
                min_w: entry.min_w,
                min_h: entry.min_h,
                display_order: self.instance(entry.id).map(|i| i.display_order).unwrap_or(0),
            })
            .collect()
    }

    /// Every entry has exactly one instance and vice versa.
    pub fn is_consistent(&self) -> bool {
        let entry_ids: HashSet<WidgetId> = self.entries.iter().map(|e| e.id).collect();
        let instance_ids: HashSet<WidgetId> = self.instances.iter().map(|i| i.id).collect();
        entry_ids.len() == self.entries.len()
            && instance_ids.len() == self.instances.len()
            && entry_ids == instance_ids
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn row(id: i64, component_name: &str) -> LayoutRow {
        LayoutRow {
            id: WidgetId(id),
            geometry: StoredGeometry {
                x: Some(0),
                y: Some(0),
                w: Some(4),
                h: Some(2),
                min_w: Some(2),
                min_h: Some(1),
            },
            widget_definition_id: Some(100 + id),
            widget_name: format!("Widget {id}"),
            component_name: component_name.to_string(),
            data_source_config: Map::new(),
            instance_config: Map::new(),
            display_order: id as i32,
        }
    }
}
