//! PostgreSQL adapter for WidgetRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{DashboardId, NewWidget, Widget, WidgetId, WidgetUpdate};
use crate::domain::ports::WidgetRepository;
use crate::entity::widgets;
use crate::error::DomainError;

/// PostgreSQL implementation of WidgetRepository
pub struct PostgresWidgetRepository {
    db: DatabaseConnection,
}

impl PostgresWidgetRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(value).map_err(|e| DomainError::Internal(e.to_string()))
}

#[async_trait]
impl WidgetRepository for PostgresWidgetRepository {
    async fn find_by_dashboard(
        &self,
        dashboard_id: &DashboardId,
    ) -> Result<Vec<Widget>, DomainError> {
        let results = widgets::Entity::find()
            .filter(widgets::Column::DashboardId.eq(dashboard_id.0))
            .order_by_asc(widgets::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn find_by_id(
        &self,
        dashboard_id: &DashboardId,
        id: &WidgetId,
    ) -> Result<Option<Widget>, DomainError> {
        let result = widgets::Entity::find_by_id(id.0)
            .filter(widgets::Column::DashboardId.eq(dashboard_id.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create(&self, widget: &NewWidget) -> Result<Widget, DomainError> {
        let model = widgets::ActiveModel {
            id: Set(Uuid::new_v4()),
            dashboard_id: Set(widget.dashboard_id.0),
            name: Set(widget.name.clone()),
            widget_type: Set(widget.widget_type.clone()),
            source: Set(widget.source.map(|s| s.to_string())),
            position: Set(to_json(&widget.position)?),
            config: Set(to_json(&widget.config)?),
            report: Set(widget.report.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update(&self, id: &WidgetId, update: &WidgetUpdate) -> Result<Widget, DomainError> {
        let existing = widgets::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Widget {}", id)))?;

        let mut active_model = existing.into_active_model();
        if let Some(name) = &update.name {
            active_model.name = Set(name.clone());
        }
        if let Some(widget_type) = &update.widget_type {
            active_model.widget_type = Set(widget_type.clone());
        }
        if let Some(source) = update.source {
            active_model.source = Set(Some(source.to_string()));
        }
        if let Some(position) = &update.position {
            active_model.position = Set(to_json(position)?);
        }
        if let Some(config) = &update.config {
            active_model.config = Set(to_json(config)?);
        }
        if let Some(report) = &update.report {
            active_model.report = Set(Some(report.clone()));
        }

        let result = active_model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn delete(&self, id: &WidgetId) -> Result<(), DomainError> {
        let result = widgets::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            Err(DomainError::NotFound(format!("Widget {}", id)))
        } else {
            Ok(())
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<widgets::Model> for Widget {
    fn from(model: widgets::Model) -> Self {
        Widget {
            id: WidgetId(model.id),
            dashboard_id: DashboardId(model.dashboard_id),
            name: model.name,
            widget_type: model.widget_type,
            source: model.source.and_then(|s| s.parse().ok()),
            position: serde_json::from_value(model.position).unwrap_or_default(),
            config: serde_json::from_value(model.config).unwrap_or_default(),
            report: model.report,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
