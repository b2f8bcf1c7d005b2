//! HTTP handlers
//!
//! Axum request handlers for the API endpoints. Every route is nested under
//! `/projects/:project`, which scopes all data to that project.

pub mod dashboards;
pub mod reports;
pub mod sources;
pub mod widgets;

pub use dashboards::{
    create_dashboard, delete_dashboard, get_dashboard, list_dashboards, set_default_dashboard,
    update_dashboard,
};
pub use reports::{get_report, request_report};
pub use sources::query_source;
pub use widgets::{create_widget, delete_widget, get_widget_data, list_widgets, update_widget};
