//! Widget handlers
//!
//! Endpoints for widgets on a dashboard and their data.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::app::CreateWidget;
use crate::domain::entities::{DashboardId, ProjectId, Widget, WidgetId, WidgetUpdate};
use crate::error::AppError;
use crate::AppState;

/// GET /projects/:project/dashboards/:id/widgets
pub async fn list_widgets(
    State(state): State<AppState>,
    Path((project, dashboard)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<Widget>>, AppError> {
    let widgets = state
        .widget_service
        .list(&ProjectId(project), &DashboardId(dashboard))
        .await?;
    Ok(Json(widgets))
}

/// POST /projects/:project/dashboards/:id/widgets
pub async fn create_widget(
    State(state): State<AppState>,
    Path((project, dashboard)): Path<(Uuid, Uuid)>,
    Json(request): Json<CreateWidget>,
) -> Result<(StatusCode, Json<Widget>), AppError> {
    let widget = state
        .widget_service
        .create(&ProjectId(project), &DashboardId(dashboard), request)
        .await?;
    Ok((StatusCode::CREATED, Json(widget)))
}

/// PATCH /projects/:project/dashboards/:id/widgets/:widget_id
pub async fn update_widget(
    State(state): State<AppState>,
    Path((project, dashboard, widget)): Path<(Uuid, Uuid, Uuid)>,
    Json(request): Json<WidgetUpdate>,
) -> Result<Json<Widget>, AppError> {
    let widget = state
        .widget_service
        .update(
            &ProjectId(project),
            &DashboardId(dashboard),
            &WidgetId(widget),
            request,
        )
        .await?;
    Ok(Json(widget))
}

/// DELETE /projects/:project/dashboards/:id/widgets/:widget_id
pub async fn delete_widget(
    State(state): State<AppState>,
    Path((project, dashboard, widget)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state
        .widget_service
        .delete(&ProjectId(project), &DashboardId(dashboard), &WidgetId(widget))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /projects/:project/dashboards/:id/widgets/:widget_id/data
///
/// Run the widget's query. Query parameters add or override filters and
/// may set `limit`, `offset`, `op_field` and `timezone`.
pub async fn get_widget_data(
    State(state): State<AppState>,
    Path((project, dashboard, widget)): Path<(Uuid, Uuid, Uuid)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let data = state
        .widget_service
        .data(
            &ProjectId(project),
            &DashboardId(dashboard),
            &WidgetId(widget),
            params,
        )
        .await?;
    Ok(Json(data))
}
