//! Data sources
//!
//! A source names a data provider widgets and reports can query. Each source
//! module declares its filter set and turns `(filters, operation, options)`
//! into a backend request; `results` normalizes what comes back.

pub mod agents;
pub mod flowruns;
pub mod flows;
pub mod queues;
pub mod results;
pub mod rooms;
pub mod tags;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;
use crate::query::filter::{parse_filters, Filters};
use crate::query::SqlQuery;

/// Filter every source requires, used for tenant isolation
pub const PROJECT_FILTER: &str = "project";

/// Default page size for `list`
pub const DEFAULT_LIMIT: u64 = 20;

/// Hard cap on a single page
pub const MAX_LIMIT: u64 = 10_000;

/// Named data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Rooms,
    Agents,
    Queues,
    Tags,
    Flows,
    #[serde(alias = "flow_runs", alias = "flow-runs")]
    FlowRuns,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Rooms => write!(f, "rooms"),
            Source::Agents => write!(f, "agents"),
            Source::Queues => write!(f, "queues"),
            Source::Tags => write!(f, "tags"),
            Source::Flows => write!(f, "flows"),
            Source::FlowRuns => write!(f, "flowruns"),
        }
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rooms" => Ok(Source::Rooms),
            "agents" => Ok(Source::Agents),
            "queues" => Ok(Source::Queues),
            "tags" => Ok(Source::Tags),
            "flows" => Ok(Source::Flows),
            "flowruns" | "flow_runs" | "flow-runs" => Ok(Source::FlowRuns),
            _ => Err(format!("Unknown source: {}", s)),
        }
    }
}

/// Operation a source can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Count,
    List,
    TimeseriesHourGroupCount,
    Sum,
    Avg,
    Recurrence,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Count => write!(f, "count"),
            Operation::List => write!(f, "list"),
            Operation::TimeseriesHourGroupCount => write!(f, "timeseries_hour_group_count"),
            Operation::Sum => write!(f, "sum"),
            Operation::Avg => write!(f, "avg"),
            Operation::Recurrence => write!(f, "recurrence"),
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(Operation::Count),
            "list" => Ok(Operation::List),
            "timeseries_hour_group_count" => Ok(Operation::TimeseriesHourGroupCount),
            "sum" => Ok(Operation::Sum),
            "avg" => Ok(Operation::Avg),
            "recurrence" => Ok(Operation::Recurrence),
            other => Err(QueryError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Operation parameters that are not filters
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub op_field: Option<String>,
    pub limit: u64,
    pub offset: u64,
    pub timezone: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            op_field: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            timezone: "UTC".to_string(),
        }
    }
}

impl QueryOptions {
    /// Split reserved keys (`op_field`, `limit`, `offset`, `timezone`) out of
    /// raw query parameters, leaving only filters behind.
    pub fn extract(params: &mut HashMap<String, String>) -> Result<Self, QueryError> {
        Self::default().override_from(params)
    }

    /// Like `extract`, starting from `self` instead of the defaults
    pub fn override_from(mut self, params: &mut HashMap<String, String>) -> Result<Self, QueryError> {
        if let Some(op_field) = params.remove("op_field") {
            self.op_field = Some(op_field);
        }
        if let Some(limit) = params.remove("limit") {
            self.limit = parse_u64("limit", &limit)?;
        }
        if let Some(offset) = params.remove("offset") {
            self.offset = parse_u64("offset", &offset)?;
        }
        if let Some(timezone) = params.remove("timezone") {
            self.timezone = timezone;
        }
        self.limit = self.limit.min(MAX_LIMIT);

        Ok(self)
    }

    pub(crate) fn require_op_field(&self, operation: Operation) -> Result<&str, QueryError> {
        self.op_field
            .as_deref()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| QueryError::InvalidFilter {
                field: "op_field".to_string(),
                reason: format!("required for '{}'", operation),
            })
    }
}

fn parse_u64(field: &str, raw: &str) -> Result<u64, QueryError> {
    raw.parse().map_err(|_| QueryError::InvalidFilter {
        field: field.to_string(),
        reason: format!("expected a non-negative integer, got '{}'", raw),
    })
}

/// Database a SQL source reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDatabase {
    Chats,
    Flows,
}

/// Backend request produced by a source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRequest {
    Sql {
        database: SqlDatabase,
        query: SqlQuery,
    },
    ElasticSearch(Value),
    ElasticCount(Value),
}

impl Source {
    pub fn operations(&self) -> &'static [Operation] {
        match self {
            Source::Rooms => &[
                Operation::Count,
                Operation::List,
                Operation::TimeseriesHourGroupCount,
                Operation::Sum,
                Operation::Avg,
            ],
            Source::Agents | Source::Queues | Source::Tags | Source::Flows => {
                &[Operation::Count, Operation::List]
            }
            Source::FlowRuns => &[
                Operation::Count,
                Operation::List,
                Operation::Recurrence,
                Operation::Sum,
                Operation::Avg,
            ],
        }
    }

    pub fn supports(&self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }

    /// Translate a filter map into the backend request for `operation`
    pub fn build_request(
        &self,
        filters: &Filters,
        operation: Operation,
        options: &QueryOptions,
    ) -> Result<SourceRequest, QueryError> {
        if !self.supports(operation) {
            return Err(QueryError::UnsupportedOperation(format!(
                "{} on {}",
                operation, self
            )));
        }

        let exprs = parse_filters(filters)?;
        if !exprs.iter().any(|f| f.name == PROJECT_FILTER) {
            return Err(QueryError::InvalidFilter {
                field: PROJECT_FILTER.to_string(),
                reason: "every source query must be scoped to a project".to_string(),
            });
        }

        let chats = |query| SourceRequest::Sql {
            database: SqlDatabase::Chats,
            query,
        };

        match self {
            Source::Rooms => rooms::build_query(&exprs, operation, options).map(chats),
            Source::Agents => agents::build_query(&exprs, operation, options).map(chats),
            Source::Queues => queues::build_query(&exprs, operation, options).map(chats),
            Source::Tags => tags::build_query(&exprs, operation, options).map(chats),
            Source::Flows => {
                flows::build_query(&exprs, operation, options).map(|query| SourceRequest::Sql {
                    database: SqlDatabase::Flows,
                    query,
                })
            }
            Source::FlowRuns => flowruns::build_request(&exprs, operation, options),
        }
    }
}
