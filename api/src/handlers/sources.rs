//! Source handlers
//!
//! Direct access to a source operation without a widget.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::entities::ProjectId;
use crate::error::AppError;
use crate::sources::{Operation, Source};
use crate::AppState;

/// GET /projects/:project/sources/:source/:operation
///
/// Query parameters are filters (`field__operator=value`), except for the
/// reserved `limit`, `offset`, `op_field` and `timezone`.
pub async fn query_source(
    State(state): State<AppState>,
    Path((project, source, operation)): Path<(Uuid, String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let source: Source = source.parse().map_err(AppError::NotFound)?;
    let operation: Operation = operation.parse()?;

    let result = state
        .source_service
        .query(&ProjectId(project), source, operation, params)
        .await?;
    Ok(Json(result))
}
