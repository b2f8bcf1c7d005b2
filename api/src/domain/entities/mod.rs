//! Domain entities
//!
//! Pure domain models for dashboards, widgets and reports.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod dashboard;
pub mod project;
pub mod report;
pub mod widget;

pub use dashboard::{Dashboard, DashboardId, DashboardUpdate, Grid, NewDashboard, MAX_FUNNEL_AMOUNT};
pub use project::ProjectId;
pub use report::{NewReport, Report, ReportConfig, ReportFormat, ReportId, ReportStatus};
pub use widget::{NewWidget, Widget, WidgetConfig, WidgetId, WidgetPosition, WidgetUpdate};
