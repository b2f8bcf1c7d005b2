//! Widget service
//!
//! Widget CRUD on a project's dashboards and widget data retrieval.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::app::SourceService;
use crate::domain::entities::{
    Dashboard, DashboardId, NewWidget, ProjectId, Widget, WidgetConfig, WidgetId, WidgetPosition,
    WidgetUpdate,
};
use crate::domain::ports::{DashboardRepository, ElasticsearchClient, SqlExecutor, WidgetRepository};
use crate::error::{AppError, DomainError};
use crate::query::{filters_from_query, parse_filters};
use crate::sources::Source;

/// Payload for creating a widget
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWidget {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub position: WidgetPosition,
    #[serde(default)]
    pub config: WidgetConfig,
    #[serde(default)]
    pub report: Option<Value>,
}

/// Service for managing widgets and fetching their data
pub struct WidgetService<DR, WR, SE, ES>
where
    DR: DashboardRepository,
    WR: WidgetRepository,
    SE: SqlExecutor,
    ES: ElasticsearchClient,
{
    dashboards: Arc<DR>,
    widgets: Arc<WR>,
    sources: Arc<SourceService<SE, ES>>,
}

impl<DR, WR, SE, ES> WidgetService<DR, WR, SE, ES>
where
    DR: DashboardRepository,
    WR: WidgetRepository,
    SE: SqlExecutor,
    ES: ElasticsearchClient,
{
    pub fn new(dashboards: Arc<DR>, widgets: Arc<WR>, sources: Arc<SourceService<SE, ES>>) -> Self {
        Self {
            dashboards,
            widgets,
            sources,
        }
    }

    /// List the widgets of a dashboard
    pub async fn list(
        &self,
        project_id: &ProjectId,
        dashboard_id: &DashboardId,
    ) -> Result<Vec<Widget>, AppError> {
        let dashboard = self.dashboard(project_id, dashboard_id).await?;
        Ok(self.widgets.find_by_dashboard(&dashboard.id).await?)
    }

    /// Add a widget to an editable dashboard
    pub async fn create(
        &self,
        project_id: &ProjectId,
        dashboard_id: &DashboardId,
        input: CreateWidget,
    ) -> Result<Widget, AppError> {
        let dashboard = self.editable_dashboard(project_id, dashboard_id).await?;
        let new_widget = NewWidget {
            dashboard_id: dashboard.id,
            name: input.name,
            widget_type: input.widget_type,
            source: input.source,
            position: input.position,
            config: input.config,
            report: input.report,
        };
        validate_widget(
            &dashboard,
            &new_widget.widget_type,
            new_widget.source,
            &new_widget.position,
            &new_widget.config,
        )?;

        let widget = self.widgets.create(&new_widget).await?;
        tracing::debug!(dashboard_id = %dashboard.id, widget_id = %widget.id, "Widget created");
        Ok(widget)
    }

    /// Apply a partial update; the merged widget must still be valid
    pub async fn update(
        &self,
        project_id: &ProjectId,
        dashboard_id: &DashboardId,
        id: &WidgetId,
        update: WidgetUpdate,
    ) -> Result<Widget, AppError> {
        let dashboard = self.editable_dashboard(project_id, dashboard_id).await?;
        let current = self.widget(&dashboard.id, id).await?;

        validate_widget(
            &dashboard,
            update.widget_type.as_deref().unwrap_or(&current.widget_type),
            update.source.or(current.source),
            update.position.as_ref().unwrap_or(&current.position),
            update.config.as_ref().unwrap_or(&current.config),
        )?;

        Ok(self.widgets.update(id, &update).await?)
    }

    /// Remove a widget from an editable dashboard
    pub async fn delete(
        &self,
        project_id: &ProjectId,
        dashboard_id: &DashboardId,
        id: &WidgetId,
    ) -> Result<(), AppError> {
        let dashboard = self.editable_dashboard(project_id, dashboard_id).await?;
        self.widget(&dashboard.id, id).await?;
        Ok(self.widgets.delete(id).await?)
    }

    /// Run the widget's source query.
    ///
    /// Request parameters override the stored options and filters; the
    /// project filter always comes from the path.
    pub async fn data(
        &self,
        project_id: &ProjectId,
        dashboard_id: &DashboardId,
        id: &WidgetId,
        mut params: HashMap<String, String>,
    ) -> Result<Value, AppError> {
        let dashboard = self.dashboard(project_id, dashboard_id).await?;
        let widget = self.widget(&dashboard.id, id).await?;
        let source = widget.source.ok_or_else(|| {
            DomainError::InvalidWidget(format!("widget {} has no source configured", widget.id))
        })?;

        let options = widget.config.query_options().override_from(&mut params)?;
        let mut filters = widget.config.filter.clone();
        filters.extend(filters_from_query(&params));

        let operation = widget.config.operation_or_default();
        tracing::debug!(
            widget_id = %widget.id,
            %source,
            %operation,
            filters = filters.len(),
            "Fetching widget data"
        );

        Ok(self
            .sources
            .execute_for_project(project_id, source, filters, operation, &options)
            .await?)
    }

    async fn dashboard(
        &self,
        project_id: &ProjectId,
        id: &DashboardId,
    ) -> Result<Dashboard, AppError> {
        self.dashboards
            .find_by_id(project_id, id)
            .await?
            .ok_or_else(|| AppError::Domain(DomainError::NotFound(format!("Dashboard {}", id))))
    }

    async fn editable_dashboard(
        &self,
        project_id: &ProjectId,
        id: &DashboardId,
    ) -> Result<Dashboard, AppError> {
        let dashboard = self.dashboard(project_id, id).await?;
        if !dashboard.is_editable {
            return Err(DomainError::Forbidden("dashboard is not editable".to_string()).into());
        }
        Ok(dashboard)
    }

    async fn widget(&self, dashboard_id: &DashboardId, id: &WidgetId) -> Result<Widget, AppError> {
        self.widgets
            .find_by_id(dashboard_id, id)
            .await?
            .ok_or_else(|| AppError::Domain(DomainError::NotFound(format!("Widget {}", id))))
    }
}

fn validate_widget(
    dashboard: &Dashboard,
    widget_type: &str,
    source: Option<Source>,
    position: &WidgetPosition,
    config: &WidgetConfig,
) -> Result<(), DomainError> {
    if widget_type.trim().is_empty() {
        return Err(DomainError::InvalidWidget("type is required".to_string()));
    }
    if !position.is_valid() || position.columns[1] > dashboard.grid.columns {
        return Err(DomainError::InvalidWidget(format!(
            "position {:?} does not fit a {}-column grid",
            position.columns, dashboard.grid.columns
        )));
    }
    if let Some(operation) = config.operation {
        match source {
            None => {
                return Err(DomainError::InvalidWidget(format!(
                    "operation '{}' needs a source",
                    operation
                )))
            }
            Some(source) if !source.supports(operation) => {
                return Err(DomainError::InvalidWidget(format!(
                    "source '{}' does not support '{}'",
                    source, operation
                )))
            }
            Some(_) => {}
        }
    }
    parse_filters(&config.filter).map_err(|e| DomainError::InvalidWidget(e.to_string()))?;
    Ok(())
}
