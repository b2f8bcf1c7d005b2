//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{
    Dashboard, DashboardId, DashboardUpdate, NewDashboard, NewReport, NewWidget, ProjectId, Report,
    ReportId, ReportStatus, Widget, WidgetId, WidgetUpdate,
};
use crate::error::DomainError;

/// Repository for Dashboard entities
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// List a project's dashboards, default first, then by name
    async fn find_by_project(&self, project_id: &ProjectId) -> Result<Vec<Dashboard>, DomainError>;

    /// Find a dashboard within a project
    async fn find_by_id(
        &self,
        project_id: &ProjectId,
        id: &DashboardId,
    ) -> Result<Option<Dashboard>, DomainError>;

    /// Create a dashboard; a default dashboard replaces the project's previous default
    async fn create(&self, dashboard: &NewDashboard) -> Result<Dashboard, DomainError>;

    /// Apply a partial update
    async fn update(
        &self,
        id: &DashboardId,
        update: &DashboardUpdate,
    ) -> Result<Dashboard, DomainError>;

    /// Make `id` the project's only default dashboard
    async fn set_default(&self, project_id: &ProjectId, id: &DashboardId)
        -> Result<(), DomainError>;

    /// Delete a dashboard and its widgets
    async fn delete(&self, id: &DashboardId) -> Result<(), DomainError>;
}

/// Repository for Widget entities
#[async_trait]
pub trait WidgetRepository: Send + Sync {
    /// List widgets of a dashboard in creation order
    async fn find_by_dashboard(&self, dashboard_id: &DashboardId)
        -> Result<Vec<Widget>, DomainError>;

    /// Find a widget within a dashboard
    async fn find_by_id(
        &self,
        dashboard_id: &DashboardId,
        id: &WidgetId,
    ) -> Result<Option<Widget>, DomainError>;

    /// Create a widget
    async fn create(&self, widget: &NewWidget) -> Result<Widget, DomainError>;

    /// Apply a partial update
    async fn update(&self, id: &WidgetId, update: &WidgetUpdate) -> Result<Widget, DomainError>;

    /// Delete a widget
    async fn delete(&self, id: &WidgetId) -> Result<(), DomainError>;
}

/// Repository for Report entities
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Store a new pending report
    async fn create(&self, report: &NewReport) -> Result<Report, DomainError>;

    /// Find a report within a project
    async fn find_by_id(
        &self,
        project_id: &ProjectId,
        id: &ReportId,
    ) -> Result<Option<Report>, DomainError>;

    /// Whether `requested_by` already has a pending or in-progress report in the project
    async fn has_open_request(
        &self,
        project_id: &ProjectId,
        requested_by: &str,
    ) -> Result<bool, DomainError>;

    /// Count reports being generated right now (interrupted ones excluded)
    async fn count_running(&self) -> Result<u64, DomainError>;

    /// Claim the next report to generate: an interrupted one first, otherwise
    /// the oldest pending. The claimed report is returned `in_progress` with
    /// `started_at` set and the interrupted flag cleared.
    async fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<Report>, DomainError>;

    /// Flag a running report so the next tick resumes it
    async fn mark_interrupted(&self, id: &ReportId) -> Result<(), DomainError>;

    /// Record the final status of an in-progress report
    ///
    /// Returns `false` when the report was no longer in progress, e.g. the
    /// timeout sweep already failed it.
    async fn finish(
        &self,
        id: &ReportId,
        status: ReportStatus,
        errors: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Fail every running report started before `started_before`; interrupted
    /// reports wait for the next tick to resume them
    async fn fail_stale(
        &self,
        started_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReportId>, DomainError>;
}
