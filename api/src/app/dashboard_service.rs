//! Dashboard service
//!
//! Dashboard lifecycle: listing, creation with optional funnel placeholders,
//! partial updates, default selection and deletion rules.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::entities::{
    Dashboard, DashboardId, DashboardUpdate, Grid, NewDashboard, NewWidget, ProjectId, Widget,
    WidgetPosition, MAX_FUNNEL_AMOUNT,
};
use crate::domain::ports::{DashboardRepository, WidgetRepository};
use crate::error::{AppError, DomainError};

const MAX_NAME_LEN: usize = 255;

/// Payload for creating a dashboard
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDashboard {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub grid: Grid,
    #[serde(default)]
    pub config: Option<Value>,
    /// Number of empty funnel widgets to lay out on the first row
    #[serde(default)]
    pub funnel_amount: u8,
}

/// Payload for updating a dashboard
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDashboard {
    #[serde(flatten)]
    pub fields: DashboardUpdate,
    /// `true` makes this the project's default; `false` is ignored
    #[serde(default)]
    pub is_default: Option<bool>,
}

/// Service for managing dashboards
pub struct DashboardService<DR, WR>
where
    DR: DashboardRepository,
    WR: WidgetRepository,
{
    dashboards: Arc<DR>,
    widgets: Arc<WR>,
}

impl<DR, WR> DashboardService<DR, WR>
where
    DR: DashboardRepository,
    WR: WidgetRepository,
{
    pub fn new(dashboards: Arc<DR>, widgets: Arc<WR>) -> Self {
        Self {
            dashboards,
            widgets,
        }
    }

    /// List a project's dashboards, default first
    pub async fn list(&self, project_id: &ProjectId) -> Result<Vec<Dashboard>, AppError> {
        Ok(self.dashboards.find_by_project(project_id).await?)
    }

    /// Get a dashboard, scoped to the project
    pub async fn get(&self, project_id: &ProjectId, id: &DashboardId) -> Result<Dashboard, AppError> {
        self.dashboards
            .find_by_id(project_id, id)
            .await?
            .ok_or_else(|| AppError::Domain(DomainError::NotFound(format!("Dashboard {}", id))))
    }

    /// Create a dashboard and its funnel placeholders
    pub async fn create(
        &self,
        project_id: &ProjectId,
        input: CreateDashboard,
    ) -> Result<(Dashboard, Vec<Widget>), AppError> {
        validate_name(&input.name)?;
        validate_grid(&input.grid)?;
        if input.funnel_amount > MAX_FUNNEL_AMOUNT {
            return Err(DomainError::InvalidDashboard(format!(
                "funnel_amount must be at most {}",
                MAX_FUNNEL_AMOUNT
            ))
            .into());
        }
        if i32::from(input.funnel_amount) > input.grid.columns {
            return Err(DomainError::InvalidDashboard(format!(
                "{} funnels do not fit a {}-column grid",
                input.funnel_amount, input.grid.columns
            ))
            .into());
        }

        let dashboard = self
            .dashboards
            .create(&NewDashboard {
                project_id: *project_id,
                name: input.name.trim().to_string(),
                description: input.description,
                is_default: input.is_default,
                is_editable: true,
                grid: input.grid,
                config: input.config.unwrap_or_else(|| Value::Object(Default::default())),
            })
            .await?;

        let mut funnels = Vec::with_capacity(input.funnel_amount as usize);
        for index in 0..input.funnel_amount {
            let position = WidgetPosition::slot(index, input.funnel_amount, dashboard.grid.columns);
            match self
                .widgets
                .create(&NewWidget::empty_funnel(dashboard.id, position))
                .await
            {
                Ok(widget) => funnels.push(widget),
                Err(e) => {
                    // Don't leave a dashboard with a partial funnel row behind
                    if let Err(cleanup) = self.dashboards.delete(&dashboard.id).await {
                        tracing::error!(
                            dashboard_id = %dashboard.id,
                            error = %cleanup,
                            "Failed to remove dashboard after funnel creation failed"
                        );
                    }
                    return Err(e.into());
                }
            }
        }

        tracing::info!(
            project_id = %project_id,
            dashboard_id = %dashboard.id,
            funnels = funnels.len(),
            "Dashboard created"
        );

        Ok((dashboard, funnels))
    }

    /// Apply a partial update; editable dashboards only
    pub async fn update(
        &self,
        project_id: &ProjectId,
        id: &DashboardId,
        input: UpdateDashboard,
    ) -> Result<Dashboard, AppError> {
        let dashboard = self.get(project_id, id).await?;
        if !dashboard.is_editable {
            return Err(DomainError::Forbidden("dashboard is not editable".to_string()).into());
        }

        let make_default = input.is_default == Some(true);
        if input.fields.is_empty() && !make_default {
            return Err(DomainError::InvalidDashboard("nothing to update".to_string()).into());
        }
        if let Some(name) = &input.fields.name {
            validate_name(name)?;
        }
        if let Some(grid) = &input.fields.grid {
            validate_grid(grid)?;
        }

        let mut updated = if input.fields.is_empty() {
            dashboard
        } else {
            self.dashboards.update(id, &input.fields).await?
        };

        if make_default && !updated.is_default {
            self.dashboards.set_default(project_id, id).await?;
            updated.is_default = true;
        }

        Ok(updated)
    }

    /// Make `id` the project's only default dashboard
    pub async fn set_default(
        &self,
        project_id: &ProjectId,
        id: &DashboardId,
    ) -> Result<Dashboard, AppError> {
        self.dashboards.set_default(project_id, id).await?;
        self.get(project_id, id).await
    }

    /// Delete a dashboard; its widgets go with it
    pub async fn delete(&self, project_id: &ProjectId, id: &DashboardId) -> Result<(), AppError> {
        let dashboard = self.get(project_id, id).await?;
        if let Some(reason) = dashboard.deletion_blocker() {
            return Err(DomainError::Forbidden(reason.to_string()).into());
        }

        self.dashboards.delete(id).await?;
        tracing::info!(project_id = %project_id, dashboard_id = %id, "Dashboard deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    let name = name.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(DomainError::InvalidDashboard(format!(
            "name must be between 1 and {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_grid(grid: &Grid) -> Result<(), DomainError> {
    if !grid.is_valid() {
        return Err(DomainError::InvalidDashboard(
            "grid columns and rows must be positive".to_string(),
        ));
    }
    Ok(())
}
