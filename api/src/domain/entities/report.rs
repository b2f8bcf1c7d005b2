//! Report domain entity
//!
//! A report is an export of one source's `list` results, requested by a
//! user and generated in the background.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::ProjectId;
use crate::query::Filters;
use crate::sources::Source;

/// Unique identifier for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ReportId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Waiting for a worker
    Pending,
    /// Claimed by a worker
    InProgress,
    /// Generated and delivered
    Ready,
    /// Generation or delivery failed
    Failed,
}

impl ReportStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, ReportStatus::Ready | ReportStatus::Failed)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Pending => write!(f, "pending"),
            ReportStatus::InProgress => write!(f, "in_progress"),
            ReportStatus::Ready => write!(f, "ready"),
            ReportStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "in_progress" => Ok(ReportStatus::InProgress),
            "ready" => Ok(ReportStatus::Ready),
            "failed" => Ok(ReportStatus::Failed),
            _ => Err(format!("Unknown report status: {}", s)),
        }
    }
}

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "text/csv",
            ReportFormat::Json => "application/json",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

/// Worker bookkeeping stored alongside the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Set when a worker shut down mid-generation; the next tick resumes it
    pub interrupted: bool,
}

/// A requested export
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: ReportId,
    pub project_id: ProjectId,
    pub source: Source,
    pub filters: Filters,
    pub fields: Option<Vec<String>>,
    pub format: ReportFormat,
    pub status: ReportStatus,
    pub requested_by: String,
    pub config: ReportConfig,
    pub errors: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn file_name(&self) -> String {
        format!(
            "{}-report-{}.{}",
            self.source,
            self.created_at.format("%Y%m%d%H%M%S"),
            self.format.extension()
        )
    }
}

/// Data needed to request a new report
#[derive(Debug, Clone)]
pub struct NewReport {
    pub project_id: ProjectId,
    pub source: Source,
    pub filters: Filters,
    pub fields: Option<Vec<String>>,
    pub format: ReportFormat,
    pub requested_by: String,
}
