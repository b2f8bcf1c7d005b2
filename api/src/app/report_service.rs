//! Report service
//!
//! Accepts export requests and generates them in the background: claim the
//! next report, page through the source's `list` operation, render the file
//! and mail it to whoever asked for it.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::app::SourceService;
use crate::domain::entities::{NewReport, ProjectId, Report, ReportFormat, ReportId, ReportStatus};
use crate::domain::ports::{
    Attachment, ElasticsearchClient, ReportEmail, ReportMailer, ReportRepository, SqlExecutor,
};
use crate::error::{AppError, DomainError};
use crate::query::filter::is_identifier;
use crate::query::{parse_filters, Filters};
use crate::sources::{Operation, QueryOptions, Source};

/// Limits applied by the report worker
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Reports allowed in progress at once
    pub max_concurrent: u64,
    /// In-progress reports older than this are failed by the sweep
    pub timeout: Duration,
    /// Rows fetched per source call
    pub page_size: u64,
    /// Rows written to a single file
    pub max_rows: u64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            timeout: Duration::minutes(60),
            page_size: 1000,
            max_rows: 100_000,
        }
    }
}

/// Payload for requesting a report
#[derive(Debug, Clone, Deserialize)]
pub struct RequestReport {
    pub source: Source,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub format: ReportFormat,
    /// Address the finished file is sent to
    pub email: String,
}

/// What a single worker tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// `max_concurrent` reports are already running
    Busy,
    /// Nothing to claim
    Idle,
    Finished {
        id: ReportId,
        status: ReportStatus,
    },
    /// Shutdown arrived mid-generation; the report will be resumed
    Interrupted(ReportId),
}

/// Service for requesting and generating reports
pub struct ReportService<RR, SE, ES, RM>
where
    RR: ReportRepository,
    SE: SqlExecutor,
    ES: ElasticsearchClient,
    RM: ReportMailer,
{
    reports: Arc<RR>,
    sources: Arc<SourceService<SE, ES>>,
    mailer: Arc<RM>,
    settings: ReportSettings,
}

impl<RR, SE, ES, RM> ReportService<RR, SE, ES, RM>
where
    RR: ReportRepository,
    SE: SqlExecutor,
    ES: ElasticsearchClient,
    RM: ReportMailer,
{
    pub fn new(
        reports: Arc<RR>,
        sources: Arc<SourceService<SE, ES>>,
        mailer: Arc<RM>,
        settings: ReportSettings,
    ) -> Self {
        Self {
            reports,
            sources,
            mailer,
            settings,
        }
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Queue a report; one open request per user and project
    pub async fn request(
        &self,
        project_id: &ProjectId,
        input: RequestReport,
    ) -> Result<Report, AppError> {
        let email = input.email.trim().to_lowercase();
        if !is_email(&email) {
            return Err(DomainError::Validation(format!(
                "'{}' is not an email address",
                input.email
            ))
            .into());
        }
        parse_filters(&input.filters).map_err(|e| DomainError::Validation(e.to_string()))?;
        if let Some(fields) = &input.fields {
            if fields.is_empty() {
                return Err(DomainError::Validation("fields must not be empty".to_string()).into());
            }
            if let Some(bad) = fields.iter().find(|f| !is_identifier(f)) {
                return Err(DomainError::Validation(format!("invalid field name '{}'", bad)).into());
            }
        }

        if self.reports.has_open_request(project_id, &email).await? {
            return Err(DomainError::Conflict(format!(
                "{} already has a report being generated",
                email
            ))
            .into());
        }

        let report = self
            .reports
            .create(&NewReport {
                project_id: *project_id,
                source: input.source,
                filters: input.filters,
                fields: input.fields,
                format: input.format,
                requested_by: email,
            })
            .await?;

        tracing::info!(
            project_id = %project_id,
            report_id = %report.id,
            source = %report.source,
            format = %report.format,
            "Report requested"
        );

        Ok(report)
    }

    /// Get a report, scoped to the project
    pub async fn get(&self, project_id: &ProjectId, id: &ReportId) -> Result<Report, AppError> {
        self.reports
            .find_by_id(project_id, id)
            .await?
            .ok_or_else(|| AppError::Domain(DomainError::NotFound(format!("Report {}", id))))
    }

    /// Claim and generate the next report.
    ///
    /// A generation error marks the report failed and is not returned; only
    /// repository errors are. When `shutdown` changes mid-generation the
    /// report is flagged interrupted and left in progress.
    pub async fn process_next(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<TickOutcome, AppError> {
        let running = self.reports.count_running().await?;
        if running >= self.settings.max_concurrent {
            tracing::debug!(
                running,
                max_concurrent = self.settings.max_concurrent,
                "Report slots full, skipping tick"
            );
            return Ok(TickOutcome::Busy);
        }

        let Some(report) = self.reports.claim_next(Utc::now()).await? else {
            return Ok(TickOutcome::Idle);
        };

        tracing::info!(
            report_id = %report.id,
            project_id = %report.project_id,
            source = %report.source,
            "Generating report"
        );

        let result = tokio::select! {
            result = self.generate(&report) => result,
            Ok(()) = shutdown.changed() => {
                self.reports.mark_interrupted(&report.id).await?;
                tracing::warn!(report_id = %report.id, "Shutdown during report generation, marked interrupted");
                return Ok(TickOutcome::Interrupted(report.id));
            }
        };

        let (status, errors) = match result {
            Ok(rows) => {
                tracing::info!(report_id = %report.id, rows, "Report delivered");
                (ReportStatus::Ready, None)
            }
            Err(e) => {
                tracing::error!(report_id = %report.id, error = %e, "Report generation failed");
                (ReportStatus::Failed, Some(e.to_string()))
            }
        };

        let recorded = self
            .reports
            .finish(&report.id, status, errors, Utc::now())
            .await?;
        if !recorded {
            tracing::warn!(
                report_id = %report.id,
                %status,
                "Report was closed while generating, keeping the stored status"
            );
        }

        Ok(TickOutcome::Finished {
            id: report.id,
            status,
        })
    }

    /// Fail in-progress reports that outlived the timeout
    pub async fn sweep(&self) -> Result<Vec<ReportId>, AppError> {
        let now = Utc::now();
        Ok(self
            .reports
            .fail_stale(now - self.settings.timeout, now)
            .await?)
    }

    /// Build and mail the file; returns the number of rows written
    async fn generate(&self, report: &Report) -> Result<usize, AppError> {
        let rows = self.collect_rows(report).await?;
        let columns = columns_for(report.fields.as_deref(), &rows);

        let content = match report.format {
            ReportFormat::Csv => render_csv(&columns, &rows)?,
            ReportFormat::Json => render_json(&columns, &rows)?,
        };

        let email = ReportEmail {
            to: report.requested_by.clone(),
            subject: format!("Your {} report is ready", report.source),
            body: format!(
                "The {} report requested on {} is attached ({} rows).",
                report.source,
                report.created_at.format("%Y-%m-%d %H:%M UTC"),
                rows.len()
            ),
            attachment: Attachment {
                filename: report.file_name(),
                content_type: report.format.content_type().to_string(),
                content,
            },
        };
        self.mailer.send(&email).await?;

        Ok(rows.len())
    }

    /// Page through the source's `list` operation up to `max_rows`
    async fn collect_rows(&self, report: &Report) -> Result<Vec<Value>, AppError> {
        let mut rows = Vec::new();
        let mut offset = 0;

        loop {
            let remaining = self.settings.max_rows.saturating_sub(rows.len() as u64);
            if remaining == 0 {
                tracing::warn!(
                    report_id = %report.id,
                    max_rows = self.settings.max_rows,
                    "Report truncated at row limit"
                );
                break;
            }

            let options = QueryOptions {
                limit: self.settings.page_size.min(remaining),
                offset,
                ..Default::default()
            };
            let page = self
                .sources
                .execute_for_project(
                    &report.project_id,
                    report.source,
                    report.filters.clone(),
                    Operation::List,
                    &options,
                )
                .await?;

            let results = match page.get("results") {
                Some(Value::Array(results)) => results.clone(),
                _ => {
                    return Err(AppError::Internal(
                        "list response without results".to_string(),
                    ))
                }
            };
            let fetched = results.len() as u64;
            rows.extend(results);

            let has_next = page.get("next").and_then(Value::as_bool).unwrap_or(false);
            if !has_next || fetched == 0 {
                break;
            }
            offset += fetched;
        }

        Ok(rows)
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Requested fields, or every key seen in the rows in first-seen order
fn columns_for(fields: Option<&[String]>, rows: &[Value]) -> Vec<String> {
    if let Some(fields) = fields {
        return fields.to_vec();
    }

    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Some(object) = row.as_object() {
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

fn render_csv(columns: &[String], rows: &[Value]) -> Result<Vec<u8>, AppError> {
    // No fields requested and no rows to infer them from
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(columns)
        .map_err(|e| AppError::Internal(format!("CSV error: {}", e)))?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| match row.get(column) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            })
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| AppError::Internal(format!("CSV error: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV error: {}", e)))
}

fn render_json(columns: &[String], rows: &[Value]) -> Result<Vec<u8>, AppError> {
    let projected: Vec<Value> = rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = columns
                .iter()
                .map(|column| (column.clone(), row.get(column).cloned().unwrap_or(Value::Null)))
                .collect();
            Value::Object(object)
        })
        .collect();

    serde_json::to_vec_pretty(&projected).map_err(|e| AppError::Internal(e.to_string()))
}
