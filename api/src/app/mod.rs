//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and data sources.

pub mod dashboard_service;
pub mod report_service;
pub mod report_worker;
pub mod source_service;
pub mod widget_service;

pub use dashboard_service::{CreateDashboard, DashboardService, UpdateDashboard};
pub use report_service::{ReportService, ReportSettings, RequestReport};
pub use report_worker::ReportWorker;
pub use source_service::SourceService;
pub use widget_service::{CreateWidget, WidgetService};
