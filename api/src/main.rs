//! Insights API Server
//!
//! Dashboards, widgets and exportable reports over a messaging platform's
//! data sources. Uses hexagonal (ports & adapters) architecture: handlers
//! call application services, services talk to ports, adapters implement
//! the ports for Postgres, Elasticsearch and the mail service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use sea_orm::Database;
use serde::Serialize;
use tokio::sync::watch;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;
mod query;
mod sources;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod integration_tests;

use adapters::{
    HttpElasticsearchClient, HttpReportMailer, PostgresDashboardRepository,
    PostgresReportRepository, PostgresSqlExecutor, PostgresWidgetRepository,
};
use app::{DashboardService, ReportService, ReportWorker, SourceService, WidgetService};
use config::Config;

type Sources = SourceService<PostgresSqlExecutor, HttpElasticsearchClient>;
type Reports = ReportService<
    PostgresReportRepository,
    PostgresSqlExecutor,
    HttpElasticsearchClient,
    HttpReportMailer,
>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub dashboard_service:
        Arc<DashboardService<PostgresDashboardRepository, PostgresWidgetRepository>>,
    pub widget_service: Arc<
        WidgetService<
            PostgresDashboardRepository,
            PostgresWidgetRepository,
            PostgresSqlExecutor,
            HttpElasticsearchClient,
        >,
    >,
    pub source_service: Arc<Sources>,
    pub report_service: Arc<Reports>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,insights_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Insights API...");

    // Load configuration
    let config = Config::from_env()?;

    // Connect to PostgreSQL: our own tables plus the two source databases
    tracing::info!("Connecting to databases...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let chats_db = Database::connect(&config.chats_database_url)
        .await
        .context("Failed to connect to chats database")?;
    let flows_db = Database::connect(&config.flows_database_url)
        .await
        .context("Failed to connect to flows database")?;
    tracing::info!("Databases connected");

    // Create adapters
    let dashboard_repo = Arc::new(PostgresDashboardRepository::new(db.clone()));
    let widget_repo = Arc::new(PostgresWidgetRepository::new(db.clone()));
    let report_repo = Arc::new(PostgresReportRepository::new(db));
    let chats = Arc::new(PostgresSqlExecutor::new(chats_db));
    let flows = Arc::new(PostgresSqlExecutor::new(flows_db));
    let elasticsearch = Arc::new(HttpElasticsearchClient::new(
        config.elasticsearch_url.clone(),
    ));
    let mailer = Arc::new(HttpReportMailer::new(
        config.mailer_url.clone(),
        config.mailer_token.clone(),
        config.mailer_from.clone(),
    ));

    // Create application services
    let source_service = Arc::new(SourceService::new(
        chats,
        flows,
        elasticsearch,
        config.flowruns_index.clone(),
    ));

    let dashboard_service = Arc::new(DashboardService::new(
        dashboard_repo.clone(),
        widget_repo.clone(),
    ));

    let widget_service = Arc::new(WidgetService::new(
        dashboard_repo,
        widget_repo,
        source_service.clone(),
    ));

    let report_service = Arc::new(ReportService::new(
        report_repo,
        source_service.clone(),
        mailer,
        config.report_settings(),
    ));

    // Background report generation
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = Arc::new(ReportWorker::new(
        report_service.clone(),
        config.report_poll_interval(),
        config.report_sweep_interval(),
    ));
    let ticks = tokio::spawn({
        let worker = worker.clone();
        let shutdown = shutdown_rx.clone();
        async move { worker.run_ticks(shutdown).await }
    });
    let sweeps = tokio::spawn({
        let worker = worker.clone();
        async move { worker.run_sweeps(shutdown_rx).await }
    });

    // Create app state
    let state = AppState {
        dashboard_service,
        widget_service,
        source_service,
        report_service,
    };

    // Rate limiting config for report requests: 1 req/sec sustained, burst of 3
    // Uses PeerIpKeyExtractor to get client IP from socket connection
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(1)
            .burst_size(3)
            .finish()
            .ok_or_else(|| anyhow!("Failed to build governor config"))?,
    );

    // Report generation is expensive, so requests are rate limited
    let rate_limited_routes = Router::new()
        .route("/projects/:project/reports", post(handlers::request_report))
        .layer(GovernorLayer {
            config: governor_config,
        });

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        // Dashboards
        .route(
            "/projects/:project/dashboards",
            get(handlers::list_dashboards).post(handlers::create_dashboard),
        )
        .route(
            "/projects/:project/dashboards/:id",
            get(handlers::get_dashboard)
                .patch(handlers::update_dashboard)
                .delete(handlers::delete_dashboard),
        )
        .route(
            "/projects/:project/dashboards/:id/default",
            post(handlers::set_default_dashboard),
        )
        // Widgets
        .route(
            "/projects/:project/dashboards/:id/widgets",
            get(handlers::list_widgets).post(handlers::create_widget),
        )
        .route(
            "/projects/:project/dashboards/:id/widgets/:widget_id",
            patch(handlers::update_widget).delete(handlers::delete_widget),
        )
        .route(
            "/projects/:project/dashboards/:id/widgets/:widget_id/data",
            get(handlers::get_widget_data),
        )
        // Sources
        .route(
            "/projects/:project/sources/:source/:operation",
            get(handlers::query_source),
        )
        // Reports
        .route("/projects/:project/reports/:id", get(handlers::get_report))
        .merge(rate_limited_routes)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutting down, stopping report worker");
        // Receivers may already be gone if the worker stopped on its own
        let _ = shutdown_tx.send(true);
    })
    .await
    .context("Server error")?;

    // Let an in-flight report record its interruption before exiting
    let _ = tokio::join!(ticks, sweeps);
    tracing::info!("Insights API stopped");

    Ok(())
}
