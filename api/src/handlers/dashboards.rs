//! Dashboard handlers
//!
//! Endpoints for dashboard management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::{CreateDashboard, UpdateDashboard};
use crate::domain::entities::{Dashboard, DashboardId, ProjectId, Widget};
use crate::error::AppError;
use crate::AppState;

/// Response for a newly created dashboard
#[derive(Debug, Serialize)]
pub struct CreatedDashboardResponse {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    /// Funnel placeholders created with the dashboard
    pub widgets: Vec<Widget>,
}

/// GET /projects/:project/dashboards
///
/// List the project's dashboards, default first.
pub async fn list_dashboards(
    State(state): State<AppState>,
    Path(project): Path<Uuid>,
) -> Result<Json<Vec<Dashboard>>, AppError> {
    let dashboards = state.dashboard_service.list(&ProjectId(project)).await?;
    Ok(Json(dashboards))
}

/// GET /projects/:project/dashboards/:id
pub async fn get_dashboard(
    State(state): State<AppState>,
    Path((project, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Dashboard>, AppError> {
    let dashboard = state
        .dashboard_service
        .get(&ProjectId(project), &DashboardId(id))
        .await?;
    Ok(Json(dashboard))
}

/// POST /projects/:project/dashboards
///
/// Create a dashboard, optionally with up to three empty funnel widgets.
pub async fn create_dashboard(
    State(state): State<AppState>,
    Path(project): Path<Uuid>,
    Json(request): Json<CreateDashboard>,
) -> Result<(StatusCode, Json<CreatedDashboardResponse>), AppError> {
    let (dashboard, widgets) = state
        .dashboard_service
        .create(&ProjectId(project), request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedDashboardResponse { dashboard, widgets }),
    ))
}

/// PATCH /projects/:project/dashboards/:id
pub async fn update_dashboard(
    State(state): State<AppState>,
    Path((project, id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateDashboard>,
) -> Result<Json<Dashboard>, AppError> {
    let dashboard = state
        .dashboard_service
        .update(&ProjectId(project), &DashboardId(id), request)
        .await?;
    Ok(Json(dashboard))
}

/// POST /projects/:project/dashboards/:id/default
///
/// Make this the project's default dashboard.
pub async fn set_default_dashboard(
    State(state): State<AppState>,
    Path((project, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Dashboard>, AppError> {
    let dashboard = state
        .dashboard_service
        .set_default(&ProjectId(project), &DashboardId(id))
        .await?;
    Ok(Json(dashboard))
}

/// DELETE /projects/:project/dashboards/:id
pub async fn delete_dashboard(
    State(state): State<AppState>,
    Path((project, id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state
        .dashboard_service
        .delete(&ProjectId(project), &DashboardId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
