//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::domain::entities::{
    Dashboard, DashboardId, DashboardUpdate, NewDashboard, NewReport, NewWidget, ProjectId, Report,
    ReportConfig, ReportId, ReportStatus, Widget, WidgetId, WidgetUpdate,
};
use crate::domain::ports::{
    DashboardRepository, ElasticsearchClient, ReportEmail, ReportMailer, ReportRepository,
    SqlExecutor, WidgetRepository,
};
use crate::error::{DomainError, MailerError, SourceError};
use crate::query::SqlQuery;

// ============================================================================
// In-Memory Dashboard Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryDashboardRepository {
    dashboards: Arc<RwLock<HashMap<DashboardId, Dashboard>>>,
}

impl InMemoryDashboardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a dashboard for testing
    pub fn with_dashboard(self, dashboard: Dashboard) -> Self {
        self.dashboards
            .write()
            .unwrap()
            .insert(dashboard.id, dashboard);
        self
    }

    pub fn defaults_in(&self, project_id: &ProjectId) -> Vec<DashboardId> {
        self.dashboards
            .read()
            .unwrap()
            .values()
            .filter(|d| d.project_id == *project_id && d.is_default)
            .map(|d| d.id)
            .collect()
    }
}

#[async_trait]
impl DashboardRepository for InMemoryDashboardRepository {
    async fn find_by_project(&self, project_id: &ProjectId) -> Result<Vec<Dashboard>, DomainError> {
        let dashboards = self.dashboards.read().unwrap();
        let mut result: Vec<Dashboard> = dashboards
            .values()
            .filter(|d| d.project_id == *project_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.is_default.cmp(&a.is_default).then(a.name.cmp(&b.name)));
        Ok(result)
    }

    async fn find_by_id(
        &self,
        project_id: &ProjectId,
        id: &DashboardId,
    ) -> Result<Option<Dashboard>, DomainError> {
        let dashboards = self.dashboards.read().unwrap();
        Ok(dashboards
            .get(id)
            .filter(|d| d.project_id == *project_id)
            .cloned())
    }

    async fn create(&self, new_dashboard: &NewDashboard) -> Result<Dashboard, DomainError> {
        let mut dashboards = self.dashboards.write().unwrap();

        if new_dashboard.is_default {
            for dashboard in dashboards.values_mut() {
                if dashboard.project_id == new_dashboard.project_id {
                    dashboard.is_default = false;
                }
            }
        }

        let dashboard = Dashboard {
            id: DashboardId::new(),
            project_id: new_dashboard.project_id,
            name: new_dashboard.name.clone(),
            description: new_dashboard.description.clone(),
            is_default: new_dashboard.is_default,
            is_editable: new_dashboard.is_editable,
            grid: new_dashboard.grid,
            config: new_dashboard.config.clone(),
            created_at: Utc::now(),
        };
        dashboards.insert(dashboard.id, dashboard.clone());
        Ok(dashboard)
    }

    async fn update(
        &self,
        id: &DashboardId,
        update: &DashboardUpdate,
    ) -> Result<Dashboard, DomainError> {
        let mut dashboards = self.dashboards.write().unwrap();
        let dashboard = dashboards
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Dashboard {}", id)))?;

        if let Some(name) = &update.name {
            dashboard.name = name.clone();
        }
        if let Some(description) = &update.description {
            dashboard.description = Some(description.clone());
        }
        if let Some(grid) = update.grid {
            dashboard.grid = grid;
        }
        if let Some(config) = &update.config {
            dashboard.config = config.clone();
        }
        Ok(dashboard.clone())
    }

    async fn set_default(
        &self,
        project_id: &ProjectId,
        id: &DashboardId,
    ) -> Result<(), DomainError> {
        let mut dashboards = self.dashboards.write().unwrap();
        if !dashboards
            .get(id)
            .is_some_and(|d| d.project_id == *project_id)
        {
            return Err(DomainError::NotFound(format!("Dashboard {}", id)));
        }

        for dashboard in dashboards.values_mut() {
            if dashboard.project_id == *project_id {
                dashboard.is_default = dashboard.id == *id;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &DashboardId) -> Result<(), DomainError> {
        let mut dashboards = self.dashboards.write().unwrap();
        dashboards
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("Dashboard {}", id)))
    }
}

// ============================================================================
// In-Memory Widget Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryWidgetRepository {
    widgets: Arc<RwLock<Vec<Widget>>>,
}

impl InMemoryWidgetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a widget for testing
    pub fn with_widget(self, widget: Widget) -> Self {
        self.widgets.write().unwrap().push(widget);
        self
    }

    pub fn count_for(&self, dashboard_id: &DashboardId) -> usize {
        self.widgets
            .read()
            .unwrap()
            .iter()
            .filter(|w| w.dashboard_id == *dashboard_id)
            .count()
    }
}

#[async_trait]
impl WidgetRepository for InMemoryWidgetRepository {
    async fn find_by_dashboard(
        &self,
        dashboard_id: &DashboardId,
    ) -> Result<Vec<Widget>, DomainError> {
        let widgets = self.widgets.read().unwrap();
        Ok(widgets
            .iter()
            .filter(|w| w.dashboard_id == *dashboard_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(
        &self,
        dashboard_id: &DashboardId,
        id: &WidgetId,
    ) -> Result<Option<Widget>, DomainError> {
        let widgets = self.widgets.read().unwrap();
        Ok(widgets
            .iter()
            .find(|w| w.id == *id && w.dashboard_id == *dashboard_id)
            .cloned())
    }

    async fn create(&self, new_widget: &NewWidget) -> Result<Widget, DomainError> {
        let widget = Widget {
            id: WidgetId::new(),
            dashboard_id: new_widget.dashboard_id,
            name: new_widget.name.clone(),
            widget_type: new_widget.widget_type.clone(),
            source: new_widget.source,
            position: new_widget.position,
            config: new_widget.config.clone(),
            report: new_widget.report.clone(),
            created_at: Utc::now(),
        };
        self.widgets.write().unwrap().push(widget.clone());
        Ok(widget)
    }

    async fn update(&self, id: &WidgetId, update: &WidgetUpdate) -> Result<Widget, DomainError> {
        let mut widgets = self.widgets.write().unwrap();
        let widget = widgets
            .iter_mut()
            .find(|w| w.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("Widget {}", id)))?;

        if let Some(name) = &update.name {
            widget.name = name.clone();
        }
        if let Some(widget_type) = &update.widget_type {
            widget.widget_type = widget_type.clone();
        }
        if let Some(source) = update.source {
            widget.source = Some(source);
        }
        if let Some(position) = update.position {
            widget.position = position;
        }
        if let Some(config) = &update.config {
            widget.config = config.clone();
        }
        if let Some(report) = &update.report {
            widget.report = Some(report.clone());
        }
        Ok(widget.clone())
    }

    async fn delete(&self, id: &WidgetId) -> Result<(), DomainError> {
        let mut widgets = self.widgets.write().unwrap();
        let before = widgets.len();
        widgets.retain(|w| w.id != *id);
        if widgets.len() == before {
            Err(DomainError::NotFound(format!("Widget {}", id)))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// In-Memory Report Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryReportRepository {
    reports: Arc<RwLock<HashMap<ReportId, Report>>>,
}

impl InMemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a report for testing
    pub fn with_report(self, report: Report) -> Self {
        self.reports.write().unwrap().insert(report.id, report);
        self
    }

    /// Current state of a report, regardless of project
    pub fn get(&self, id: &ReportId) -> Option<Report> {
        self.reports.read().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn create(&self, new_report: &NewReport) -> Result<Report, DomainError> {
        let report = Report {
            id: ReportId::new(),
            project_id: new_report.project_id,
            source: new_report.source,
            filters: new_report.filters.clone(),
            fields: new_report.fields.clone(),
            format: new_report.format,
            status: ReportStatus::Pending,
            requested_by: new_report.requested_by.clone(),
            config: ReportConfig::default(),
            errors: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        self.reports
            .write()
            .unwrap()
            .insert(report.id, report.clone());
        Ok(report)
    }

    async fn find_by_id(
        &self,
        project_id: &ProjectId,
        id: &ReportId,
    ) -> Result<Option<Report>, DomainError> {
        let reports = self.reports.read().unwrap();
        Ok(reports
            .get(id)
            .filter(|r| r.project_id == *project_id)
            .cloned())
    }

    async fn has_open_request(
        &self,
        project_id: &ProjectId,
        requested_by: &str,
    ) -> Result<bool, DomainError> {
        let reports = self.reports.read().unwrap();
        Ok(reports.values().any(|r| {
            r.project_id == *project_id
                && r.requested_by == requested_by
                && !r.status.is_finished()
        }))
    }

    async fn count_running(&self) -> Result<u64, DomainError> {
        let reports = self.reports.read().unwrap();
        Ok(reports
            .values()
            .filter(|r| r.status == ReportStatus::InProgress && !r.config.interrupted)
            .count() as u64)
    }

    async fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<Report>, DomainError> {
        let mut reports = self.reports.write().unwrap();

        let interrupted = reports
            .values()
            .filter(|r| r.status == ReportStatus::InProgress && r.config.interrupted)
            .min_by_key(|r| r.created_at)
            .map(|r| r.id);
        let next = interrupted.or_else(|| {
            reports
                .values()
                .filter(|r| r.status == ReportStatus::Pending)
                .min_by_key(|r| r.created_at)
                .map(|r| r.id)
        });

        Ok(next.and_then(|id| reports.get_mut(&id)).map(|report| {
            report.status = ReportStatus::InProgress;
            report.started_at = Some(now);
            report.config.interrupted = false;
            report.clone()
        }))
    }

    async fn mark_interrupted(&self, id: &ReportId) -> Result<(), DomainError> {
        let mut reports = self.reports.write().unwrap();
        if let Some(report) = reports
            .get_mut(id)
            .filter(|r| r.status == ReportStatus::InProgress)
        {
            report.config.interrupted = true;
        }
        Ok(())
    }

    async fn finish(
        &self,
        id: &ReportId,
        status: ReportStatus,
        errors: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut reports = self.reports.write().unwrap();
        let report = reports
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Report {}", id)))?;
        if report.status != ReportStatus::InProgress {
            return Ok(false);
        }
        report.status = status;
        report.errors = errors;
        report.completed_at = Some(now);
        Ok(true)
    }

    async fn fail_stale(
        &self,
        started_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReportId>, DomainError> {
        let mut reports = self.reports.write().unwrap();
        let mut failed = Vec::new();
        for report in reports.values_mut() {
            if report.status == ReportStatus::InProgress
                && !report.config.interrupted
                && report.started_at.is_some_and(|s| s < started_before)
            {
                report.status = ReportStatus::Failed;
                report.errors = Some("Report generation timed out".to_string());
                report.completed_at = Some(now);
                failed.push(report.id);
            }
        }
        Ok(failed)
    }
}

// ============================================================================
// Mock SQL Executor
// ============================================================================

/// Returns queued row sets in order, then the default rows; records every query
#[derive(Default)]
pub struct MockSqlExecutor {
    default_rows: Vec<Value>,
    responses: RwLock<VecDeque<Vec<Value>>>,
    queries: RwLock<Vec<SqlQuery>>,
    fail: bool,
    hang: bool,
}

impl MockSqlExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            default_rows: rows,
            ..Default::default()
        }
    }

    /// Every query fails with a database error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Every query waits forever
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    pub fn push_response(&self, rows: Vec<Value>) {
        self.responses.write().unwrap().push_back(rows);
    }

    pub fn queries(&self) -> Vec<SqlQuery> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for MockSqlExecutor {
    async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Value>, SourceError> {
        self.queries.write().unwrap().push(query.clone());

        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(SourceError::Database("connection refused".to_string()));
        }

        let queued = self.responses.write().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| self.default_rows.clone()))
    }
}

// ============================================================================
// Mock Elasticsearch Client
// ============================================================================

/// Canned Elasticsearch responses; records `(endpoint, index, body)` per call
pub struct MockElasticsearchClient {
    search_response: RwLock<Value>,
    count_response: RwLock<Value>,
    calls: RwLock<Vec<(String, String, Value)>>,
}

impl Default for MockElasticsearchClient {
    fn default() -> Self {
        Self {
            search_response: RwLock::new(json!({"hits": {"total": {"value": 0}, "hits": []}})),
            count_response: RwLock::new(json!({"count": 0})),
            calls: RwLock::new(Vec::new()),
        }
    }
}

impl MockElasticsearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_search_response(&self, response: Value) {
        *self.search_response.write().unwrap() = response;
    }

    pub fn set_count_response(&self, response: Value) {
        *self.count_response.write().unwrap() = response;
    }

    pub fn calls(&self) -> Vec<(String, String, Value)> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ElasticsearchClient for MockElasticsearchClient {
    async fn search(&self, index: &str, body: &Value) -> Result<Value, SourceError> {
        self.calls
            .write()
            .unwrap()
            .push(("_search".to_string(), index.to_string(), body.clone()));
        Ok(self.search_response.read().unwrap().clone())
    }

    async fn count(&self, index: &str, body: &Value) -> Result<Value, SourceError> {
        self.calls
            .write()
            .unwrap()
            .push(("_count".to_string(), index.to_string(), body.clone()));
        Ok(self.count_response.read().unwrap().clone())
    }
}

// ============================================================================
// Mock Report Mailer
// ============================================================================

#[derive(Default)]
pub struct MockReportMailer {
    sent: RwLock<Vec<ReportEmail>>,
    fail: bool,
}

impl MockReportMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with an API error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<ReportEmail> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl ReportMailer for MockReportMailer {
    async fn send(&self, email: &ReportEmail) -> Result<(), MailerError> {
        if self.fail {
            return Err(MailerError::Api {
                status: 503,
                message: "mail service unavailable".to_string(),
            });
        }
        self.sent.write().unwrap().push(email.clone());
        Ok(())
    }
}
