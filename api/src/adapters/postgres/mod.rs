//! PostgreSQL adapters
//!
//! Repositories for the Insights tables using SeaORM, plus the raw SQL
//! executor used by the chats and flows sources.

pub mod dashboard_repo;
pub mod report_repo;
pub mod sql_executor;
pub mod widget_repo;


pub use dashboard_repo::PostgresDashboardRepository;
pub use report_repo::PostgresReportRepository;
pub use sql_executor::PostgresSqlExecutor;
pub use widget_repo::PostgresWidgetRepository;
