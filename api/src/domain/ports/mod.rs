//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod mailer;
pub mod repositories;
pub mod sources;

pub use mailer::{Attachment, ReportEmail, ReportMailer};
pub use repositories::{DashboardRepository, ReportRepository, WidgetRepository};
pub use sources::{ElasticsearchClient, SqlExecutor};
