//! PostgreSQL adapter for DashboardRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{Dashboard, DashboardId, DashboardUpdate, NewDashboard, ProjectId};
use crate::domain::ports::DashboardRepository;
use crate::entity::dashboards;
use crate::error::DomainError;

/// PostgreSQL implementation of DashboardRepository
pub struct PostgresDashboardRepository {
    db: DatabaseConnection,
}

impl PostgresDashboardRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DashboardRepository for PostgresDashboardRepository {
    async fn find_by_project(&self, project_id: &ProjectId) -> Result<Vec<Dashboard>, DomainError> {
        let results = dashboards::Entity::find()
            .filter(dashboards::Column::ProjectId.eq(project_id.0))
            .order_by_desc(dashboards::Column::IsDefault)
            .order_by_asc(dashboards::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn find_by_id(
        &self,
        project_id: &ProjectId,
        id: &DashboardId,
    ) -> Result<Option<Dashboard>, DomainError> {
        let result = dashboards::Entity::find_by_id(id.0)
            .filter(dashboards::Column::ProjectId.eq(project_id.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create(&self, dashboard: &NewDashboard) -> Result<Dashboard, DomainError> {
        let grid = serde_json::to_value(dashboard.grid)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if dashboard.is_default {
            dashboards::Entity::update_many()
                .col_expr(dashboards::Column::IsDefault, Expr::value(false))
                .filter(dashboards::Column::ProjectId.eq(dashboard.project_id.0))
                .filter(dashboards::Column::IsDefault.eq(true))
                .exec(&txn)
                .await
                .map_err(|e| DomainError::Database(e.to_string()))?;
        }

        let model = dashboards::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(dashboard.project_id.0),
            name: Set(dashboard.name.clone()),
            description: Set(dashboard.description.clone()),
            is_default: Set(dashboard.is_default),
            is_editable: Set(dashboard.is_editable),
            grid: Set(grid),
            config: Set(dashboard.config.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update(
        &self,
        id: &DashboardId,
        update: &DashboardUpdate,
    ) -> Result<Dashboard, DomainError> {
        let existing = dashboards::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Dashboard {}", id)))?;

        let mut active_model = existing.into_active_model();
        if let Some(name) = &update.name {
            active_model.name = Set(name.clone());
        }
        if let Some(description) = &update.description {
            active_model.description = Set(Some(description.clone()));
        }
        if let Some(grid) = update.grid {
            let grid =
                serde_json::to_value(grid).map_err(|e| DomainError::Internal(e.to_string()))?;
            active_model.grid = Set(grid);
        }
        if let Some(config) = &update.config {
            active_model.config = Set(config.clone());
        }

        let result = active_model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn set_default(
        &self,
        project_id: &ProjectId,
        id: &DashboardId,
    ) -> Result<(), DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        // Clear first; the partial unique index rejects two defaults at once
        dashboards::Entity::update_many()
            .col_expr(dashboards::Column::IsDefault, Expr::value(false))
            .filter(dashboards::Column::ProjectId.eq(project_id.0))
            .filter(dashboards::Column::IsDefault.eq(true))
            .filter(dashboards::Column::Id.ne(id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let result = dashboards::Entity::update_many()
            .col_expr(dashboards::Column::IsDefault, Expr::value(true))
            .filter(dashboards::Column::ProjectId.eq(project_id.0))
            .filter(dashboards::Column::Id.eq(id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            // Dropping the transaction rolls the clear back
            return Err(DomainError::NotFound(format!(
                "Dashboard {} in project {}",
                id, project_id
            )));
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, id: &DashboardId) -> Result<(), DomainError> {
        let result = dashboards::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            Err(DomainError::NotFound(format!("Dashboard {}", id)))
        } else {
            Ok(())
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<dashboards::Model> for Dashboard {
    fn from(model: dashboards::Model) -> Self {
        Dashboard {
            id: DashboardId(model.id),
            project_id: ProjectId(model.project_id),
            name: model.name,
            description: model.description,
            is_default: model.is_default,
            is_editable: model.is_editable,
            grid: serde_json::from_value(model.grid).unwrap_or_default(),
            config: model.config,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
