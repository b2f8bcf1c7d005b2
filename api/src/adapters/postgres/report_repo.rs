//! PostgreSQL adapter for ReportRepository
//!
//! Claiming and sweeping use raw SQL so each runs as a single statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, Set, Statement,
};
use uuid::Uuid;

use crate::domain::entities::{
    NewReport, ProjectId, Report, ReportConfig, ReportFormat, ReportId, ReportStatus,
};
use crate::domain::ports::ReportRepository;
use crate::entity::reports;
use crate::error::DomainError;
use crate::sources::Source;

/// Error recorded on reports failed by the timeout sweep
pub const TIMEOUT_ERROR: &str = "Report generation timed out";

const INTERRUPTED: &str = "COALESCE((config->>'interrupted')::boolean, false)";

/// PostgreSQL implementation of ReportRepository
pub struct PostgresReportRepository {
    db: DatabaseConnection,
}

impl PostgresReportRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    async fn create(&self, report: &NewReport) -> Result<Report, DomainError> {
        let fields = report
            .fields
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let config = serde_json::to_value(ReportConfig::default())
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let model = reports::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(report.project_id.0),
            source: Set(report.source.to_string()),
            filters: Set(serde_json::Value::Object(report.filters.clone())),
            fields: Set(fields),
            format: Set(report.format.to_string()),
            status: Set(ReportStatus::Pending.to_string()),
            requested_by: Set(report.requested_by.clone()),
            config: Set(config),
            errors: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
            started_at: Set(None),
            completed_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn find_by_id(
        &self,
        project_id: &ProjectId,
        id: &ReportId,
    ) -> Result<Option<Report>, DomainError> {
        let result = reports::Entity::find_by_id(id.0)
            .filter(reports::Column::ProjectId.eq(project_id.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn has_open_request(
        &self,
        project_id: &ProjectId,
        requested_by: &str,
    ) -> Result<bool, DomainError> {
        let count = reports::Entity::find()
            .filter(reports::Column::ProjectId.eq(project_id.0))
            .filter(reports::Column::RequestedBy.eq(requested_by))
            .filter(reports::Column::Status.is_in([
                ReportStatus::Pending.to_string(),
                ReportStatus::InProgress.to_string(),
            ]))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    async fn count_running(&self) -> Result<u64, DomainError> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            format!(
                "SELECT COUNT(*) AS value FROM reports WHERE status = $1 AND NOT {}",
                INTERRUPTED
            ),
            [ReportStatus::InProgress.to_string().into()],
        );

        let row = self
            .db
            .query_one(stmt)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let count: i64 = match row {
            Some(row) => row
                .try_get("", "value")
                .map_err(|e| DomainError::Database(e.to_string()))?,
            None => 0,
        };

        Ok(count.max(0) as u64)
    }

    async fn claim_next(&self, now: DateTime<Utc>) -> Result<Option<Report>, DomainError> {
        // Interrupted reports sort ahead of pending ones, then oldest first
        let sql = format!(
            "UPDATE reports \
             SET status = $1, started_at = $2, \
                 config = jsonb_set(config, '{{interrupted}}', 'false'::jsonb) \
             WHERE id = ( \
                 SELECT id FROM reports \
                 WHERE status = $3 OR (status = $1 AND {interrupted}) \
                 ORDER BY (status = $1) DESC, created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING *",
            interrupted = INTERRUPTED
        );
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            sql,
            [
                ReportStatus::InProgress.to_string().into(),
                now.fixed_offset().into(),
                ReportStatus::Pending.to_string().into(),
            ],
        );

        let result = reports::Entity::find()
            .from_raw_sql(stmt)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn mark_interrupted(&self, id: &ReportId) -> Result<(), DomainError> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE reports SET config = jsonb_set(config, '{interrupted}', 'true'::jsonb) \
             WHERE id = $1 AND status = $2",
            [id.0.into(), ReportStatus::InProgress.to_string().into()],
        );

        self.db
            .execute(stmt)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn finish(
        &self,
        id: &ReportId,
        status: ReportStatus,
        errors: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = reports::Entity::update_many()
            .col_expr(reports::Column::Status, Expr::value(status.to_string()))
            .col_expr(reports::Column::Errors, Expr::value(errors))
            .col_expr(
                reports::Column::CompletedAt,
                Expr::value(Some(now.fixed_offset())),
            )
            .filter(reports::Column::Id.eq(id.0))
            .filter(reports::Column::Status.eq(ReportStatus::InProgress.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn fail_stale(
        &self,
        started_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReportId>, DomainError> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            format!(
                "UPDATE reports SET status = $1, errors = $2, completed_at = $3 \
                 WHERE status = $4 AND started_at < $5 AND NOT {} \
                 RETURNING id",
                INTERRUPTED
            ),
            [
                ReportStatus::Failed.to_string().into(),
                TIMEOUT_ERROR.into(),
                now.fixed_offset().into(),
                ReportStatus::InProgress.to_string().into(),
                started_before.fixed_offset().into(),
            ],
        );

        let rows = self
            .db
            .query_all(stmt)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Uuid>("", "id")
                    .map(ReportId)
                    .map_err(|e| DomainError::Database(e.to_string()))
            })
            .collect()
    }
}

/// Convert SeaORM model to domain entity
impl From<reports::Model> for Report {
    fn from(model: reports::Model) -> Self {
        Report {
            id: ReportId(model.id),
            project_id: ProjectId(model.project_id),
            source: model.source.parse().unwrap_or(Source::Rooms),
            filters: match model.filters {
                serde_json::Value::Object(map) => map,
                _ => Default::default(),
            },
            fields: model.fields.and_then(|v| serde_json::from_value(v).ok()),
            format: model.format.parse().unwrap_or(ReportFormat::Csv),
            status: model.status.parse().unwrap_or(ReportStatus::Pending),
            requested_by: model.requested_by,
            config: serde_json::from_value(model.config).unwrap_or_default(),
            errors: model.errors,
            created_at: model.created_at.with_timezone(&Utc),
            started_at: model.started_at.map(|dt| dt.with_timezone(&Utc)),
            completed_at: model.completed_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
