//! Report handlers
//!
//! Endpoints for requesting exports and checking on them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::app::RequestReport;
use crate::domain::entities::{ProjectId, Report, ReportId};
use crate::error::AppError;
use crate::AppState;

/// POST /projects/:project/reports
///
/// Queue a report. The file is mailed to `email` once generated.
pub async fn request_report(
    State(state): State<AppState>,
    Path(project): Path<Uuid>,
    Json(request): Json<RequestReport>,
) -> Result<(StatusCode, Json<Report>), AppError> {
    let report = state
        .report_service
        .request(&ProjectId(project), request)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(report)))
}

/// GET /projects/:project/reports/:id
pub async fn get_report(
    State(state): State<AppState>,
    Path((project, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Report>, AppError> {
    let report = state
        .report_service
        .get(&ProjectId(project), &ReportId(id))
        .await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ReportFormat;
    use crate::sources::Source;
    use crate::test_utils::*;

    // ===== RequestReport tests =====

    #[test]
    fn parse_request_report_minimal() {
        let json = r#"{"source": "rooms", "email": "ops@example.com"}"#;
        let request: RequestReport = serde_json::from_str(json).unwrap();
        assert_eq!(request.source, Source::Rooms);
        assert_eq!(request.format, ReportFormat::Csv);
        assert!(request.filters.is_empty());
        assert!(request.fields.is_none());
        assert_eq!(request.email, "ops@example.com");
    }

    #[test]
    fn parse_request_report_flow_runs() {
        let json = r#"{
            "source": "flow-runs",
            "filters": {"flow": "7c1f3f60-5c7e-4f62-9d9e-6a4f1d1e2b3c"},
            "fields": ["contact", "exit_type"],
            "format": "json",
            "email": "ops@example.com"
        }"#;
        let request: RequestReport = serde_json::from_str(json).unwrap();
        assert_eq!(request.source, Source::FlowRuns);
        assert_eq!(request.format, ReportFormat::Json);
        assert_eq!(request.fields.unwrap(), vec!["contact", "exit_type"]);
        assert!(request.filters.contains_key("flow"));
    }

    #[test]
    fn parse_request_report_rejects_unknown_format() {
        let json = r#"{"source": "rooms", "format": "xlsx", "email": "ops@example.com"}"#;
        let result: Result<RequestReport, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn parse_request_report_missing_email() {
        let result: Result<RequestReport, _> = serde_json::from_str(r#"{"source": "rooms"}"#);
        assert!(result.is_err());
    }

    // ===== Report response tests =====

    #[test]
    fn report_serializes_lowercase_enums() {
        let report = test_report(test_project_id());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["format"], "csv");
        assert_eq!(json["source"], "rooms");
    }
}
