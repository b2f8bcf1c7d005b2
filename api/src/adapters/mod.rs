//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod elasticsearch;
pub mod mailer;
pub mod postgres;

pub use elasticsearch::HttpElasticsearchClient;
pub use mailer::HttpReportMailer;
pub use postgres::{
    PostgresDashboardRepository, PostgresReportRepository, PostgresSqlExecutor,
    PostgresWidgetRepository,
};
