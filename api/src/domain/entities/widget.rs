//! Widget domain entity
//!
//! A widget is one visualization on a dashboard. Its `config` tells the
//! source executor what to run: an operation, an optional field to aggregate
//! and a stored filter map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::dashboard::DashboardId;
use crate::query::Filters;
use crate::sources::{Operation, QueryOptions, Source};

/// Widget type used for the empty funnels a dashboard can be created with
pub const FUNNEL_WIDGET_TYPE: &str = "graph_funnel";

/// Unique identifier for a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetId(pub Uuid);

impl WidgetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for WidgetId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placement of a widget on the dashboard grid, as inclusive `[start, end]` spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub rows: [i32; 2],
    pub columns: [i32; 2],
}

impl Default for WidgetPosition {
    fn default() -> Self {
        Self {
            rows: [1, 1],
            columns: [1, 4],
        }
    }
}

impl WidgetPosition {
    pub fn is_valid(&self) -> bool {
        self.rows[0] >= 1
            && self.columns[0] >= 1
            && self.rows[0] <= self.rows[1]
            && self.columns[0] <= self.columns[1]
    }

    /// Slot `index` of a row split into `count` equal parts
    pub fn slot(index: u8, count: u8, grid_columns: i32) -> Self {
        let width = (grid_columns / i32::from(count.max(1))).max(1);
        let start = i32::from(index) * width + 1;
        Self {
            rows: [1, 1],
            columns: [start, start + width - 1],
        }
    }
}

/// How a widget queries its source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub operation: Option<Operation>,
    pub op_field: Option<String>,
    pub filter: Filters,
    pub limit: Option<u64>,
}

impl WidgetConfig {
    /// Operation to run when none is configured
    pub fn operation_or_default(&self) -> Operation {
        self.operation.unwrap_or(Operation::Count)
    }

    /// Query options from the stored config; request options override these
    pub fn query_options(&self) -> QueryOptions {
        let mut options = QueryOptions {
            op_field: self.op_field.clone(),
            ..Default::default()
        };
        if let Some(limit) = self.limit {
            options.limit = limit;
        }
        options
    }
}

/// A widget placed on a dashboard
#[derive(Debug, Clone, Serialize)]
pub struct Widget {
    pub id: WidgetId,
    pub dashboard_id: DashboardId,
    pub name: String,
    #[serde(rename = "type")]
    pub widget_type: String,
    pub source: Option<Source>,
    pub position: WidgetPosition,
    pub config: WidgetConfig,
    /// Nested widget configuration shown when the widget is expanded
    pub report: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a new widget
#[derive(Debug, Clone)]
pub struct NewWidget {
    pub dashboard_id: DashboardId,
    pub name: String,
    pub widget_type: String,
    pub source: Option<Source>,
    pub position: WidgetPosition,
    pub config: WidgetConfig,
    pub report: Option<Value>,
}

impl NewWidget {
    /// Unconfigured funnel placeholder
    pub fn empty_funnel(dashboard_id: DashboardId, position: WidgetPosition) -> Self {
        Self {
            dashboard_id,
            name: String::new(),
            widget_type: FUNNEL_WIDGET_TYPE.to_string(),
            source: None,
            position,
            config: WidgetConfig::default(),
            report: None,
        }
    }
}

/// Partial update of a widget
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WidgetUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub widget_type: Option<String>,
    pub source: Option<Source>,
    pub position: Option<WidgetPosition>,
    pub config: Option<WidgetConfig>,
    pub report: Option<Value>,
}
