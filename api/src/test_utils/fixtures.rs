//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::domain::entities::{
    Dashboard, DashboardId, Grid, ProjectId, Report, ReportConfig, ReportFormat, ReportId,
    ReportStatus, Widget, WidgetConfig, WidgetId, WidgetPosition,
};
use crate::query::Filters;
use crate::sources::{Operation, Source};

/// Create a random project id
pub fn test_project_id() -> ProjectId {
    ProjectId(Uuid::new_v4())
}

/// Create an editable, non-default dashboard
pub fn test_dashboard(project_id: ProjectId) -> Dashboard {
    Dashboard {
        id: DashboardId::new(),
        project_id,
        name: "Human service".to_string(),
        description: None,
        is_default: false,
        is_editable: true,
        grid: Grid::default(),
        config: json!({}),
        created_at: Utc::now(),
    }
}

/// Create the project's default dashboard
pub fn test_default_dashboard(project_id: ProjectId) -> Dashboard {
    Dashboard {
        name: "Default".to_string(),
        is_default: true,
        ..test_dashboard(project_id)
    }
}

/// Create a dashboard that cannot be edited or deleted
pub fn test_locked_dashboard(project_id: ProjectId) -> Dashboard {
    Dashboard {
        name: "Locked".to_string(),
        is_editable: false,
        ..test_dashboard(project_id)
    }
}

/// Create a rooms count card
pub fn test_widget(dashboard_id: DashboardId) -> Widget {
    Widget {
        id: WidgetId::new(),
        dashboard_id,
        name: "Active rooms".to_string(),
        widget_type: "card".to_string(),
        source: Some(Source::Rooms),
        position: WidgetPosition::default(),
        config: WidgetConfig {
            operation: Some(Operation::Count),
            filter: test_filters(&[("is_active", json!(true))]),
            ..Default::default()
        },
        report: None,
        created_at: Utc::now(),
    }
}

/// Create a pending rooms report
pub fn test_report(project_id: ProjectId) -> Report {
    Report {
        id: ReportId::new(),
        project_id,
        source: Source::Rooms,
        filters: Filters::new(),
        fields: None,
        format: ReportFormat::Csv,
        status: ReportStatus::Pending,
        requested_by: "ops@example.com".to_string(),
        config: ReportConfig::default(),
        errors: None,
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
    }
}

/// Create a report that was in progress when the process stopped
pub fn test_interrupted_report(project_id: ProjectId) -> Report {
    Report {
        status: ReportStatus::InProgress,
        config: ReportConfig { interrupted: true },
        started_at: Some(Utc::now()),
        ..test_report(project_id)
    }
}

/// Build a filter map from `(key, value)` pairs
pub fn test_filters(pairs: &[(&str, serde_json::Value)]) -> Filters {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}
