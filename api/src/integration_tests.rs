//! Full integration tests for the Insights API
//!
//! End-to-end flows across services, wired the way `main` wires them but
//! with in-memory repositories and mock backends:
//! 1. Create a dashboard with funnels
//! 2. Configure a funnel widget on flow runs
//! 3. Fetch its data
//! 4. Request a report and let the worker deliver it
//!
//! Run with: cargo test integration_tests

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde_json::json;
    use tokio::sync::watch;

    use crate::app::report_service::TickOutcome;
    use crate::app::{
        CreateDashboard, DashboardService, ReportService, ReportSettings, RequestReport,
        SourceService, WidgetService,
    };
    use crate::domain::entities::{
        Grid, ReportFormat, ReportStatus, WidgetConfig, WidgetUpdate,
    };
    use crate::sources::{Operation, Source};
    use crate::test_utils::*;

    struct App {
        dashboards: DashboardService<InMemoryDashboardRepository, InMemoryWidgetRepository>,
        widgets: WidgetService<
            InMemoryDashboardRepository,
            InMemoryWidgetRepository,
            MockSqlExecutor,
            MockElasticsearchClient,
        >,
        reports: ReportService<
            InMemoryReportRepository,
            MockSqlExecutor,
            MockElasticsearchClient,
            MockReportMailer,
        >,
        report_repo: Arc<InMemoryReportRepository>,
        chats: Arc<MockSqlExecutor>,
        elasticsearch: Arc<MockElasticsearchClient>,
        mailer: Arc<MockReportMailer>,
    }

    fn app() -> App {
        let dashboard_repo = Arc::new(InMemoryDashboardRepository::new());
        let widget_repo = Arc::new(InMemoryWidgetRepository::new());
        let report_repo = Arc::new(InMemoryReportRepository::new());
        let chats = Arc::new(MockSqlExecutor::new());
        let elasticsearch = Arc::new(MockElasticsearchClient::new());
        let mailer = Arc::new(MockReportMailer::new());

        let sources = Arc::new(SourceService::new(
            chats.clone(),
            Arc::new(MockSqlExecutor::new()),
            elasticsearch.clone(),
            "flowruns-*".to_string(),
        ));

        App {
            dashboards: DashboardService::new(dashboard_repo.clone(), widget_repo.clone()),
            widgets: WidgetService::new(dashboard_repo, widget_repo, sources.clone()),
            reports: ReportService::new(
                report_repo.clone(),
                sources,
                mailer.clone(),
                ReportSettings::default(),
            ),
            report_repo,
            chats,
            elasticsearch,
            mailer,
        }
    }

    /// Funnel dashboard, configured on flow runs, answered by Elasticsearch
    #[tokio::test]
    async fn funnel_dashboard_flow() {
        let app = app();
        let project = test_project_id();

        let (dashboard, funnels) = app
            .dashboards
            .create(
                &project,
                CreateDashboard {
                    name: "Bot funnel".to_string(),
                    description: Some("Where contacts leave the flow".to_string()),
                    is_default: true,
                    grid: Grid::default(),
                    config: None,
                    funnel_amount: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(funnels.len(), 2);

        let mut filter = test_filters(&[("flow", json!("7c1f3f60-5c7e-4f62-9d9e-6a4f1d1e2b3c"))]);
        filter.insert("created_on__gte".to_string(), json!("2024-01-01"));
        app.widgets
            .update(
                &project,
                &dashboard.id,
                &funnels[0].id,
                WidgetUpdate {
                    name: Some("Menu choices".to_string()),
                    source: Some(Source::FlowRuns),
                    config: Some(WidgetConfig {
                        operation: Some(Operation::Recurrence),
                        op_field: Some("menu_option".to_string()),
                        filter,
                        limit: Some(5),
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        app.elasticsearch.set_search_response(json!({
            "hits": {"total": {"value": 4}, "hits": []},
            "aggregations": {"values": {
                "doc_count": 4,
                "agg_field": {"agg_value": {"buckets": [
                    {"key": "sales", "doc_count": 3},
                    {"key": "support", "doc_count": 1}
                ]}}
            }}
        }));

        let data = app
            .widgets
            .data(&project, &dashboard.id, &funnels[0].id, HashMap::new())
            .await
            .unwrap();

        assert_eq!(data["results"][0]["label"], "sales");
        assert_eq!(data["results"][0]["value"], json!(75.0));

        let calls = app.elasticsearch.calls();
        assert_eq!(calls.len(), 1);
        let (endpoint, index, body) = &calls[0];
        assert_eq!(endpoint, "_search");
        assert_eq!(index, "flowruns-*");
        // Tenant filter is always present
        assert!(body.to_string().contains(&project.to_string()));
    }

    /// Report requested over the API and delivered by a worker tick
    #[tokio::test]
    async fn report_flow() {
        let app = app();
        let project = test_project_id();
        app.chats.push_response(vec![
            json!({"uuid": "r1", "contact": "Ana"}),
            json!({"uuid": "r2", "contact": "Bruno"}),
        ]);

        let report = app
            .reports
            .request(
                &project,
                RequestReport {
                    source: Source::Rooms,
                    filters: test_filters(&[("is_active", json!(false))]),
                    fields: Some(vec!["uuid".to_string(), "contact".to_string()]),
                    format: ReportFormat::Csv,
                    email: "supervisor@example.com".to_string(),
                },
            )
            .await
            .unwrap();

        let (_tx, mut rx) = watch::channel(false);
        let outcome = app.reports.process_next(&mut rx).await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Finished {
                id: report.id,
                status: ReportStatus::Ready
            }
        );

        let stored = app.reports.get(&project, &report.id).await.unwrap();
        assert_eq!(stored.status, ReportStatus::Ready);
        assert!(app.report_repo.get(&report.id).unwrap().completed_at.is_some());

        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "supervisor@example.com");
        assert_eq!(
            String::from_utf8(sent[0].attachment.content.clone()).unwrap(),
            "uuid,contact\nr1,Ana\nr2,Bruno\n"
        );

        // The user can ask again once the first one is done
        app.reports
            .request(
                &project,
                RequestReport {
                    source: Source::Agents,
                    filters: Default::default(),
                    fields: None,
                    format: ReportFormat::Json,
                    email: "supervisor@example.com".to_string(),
                },
            )
            .await
            .unwrap();
    }
}
