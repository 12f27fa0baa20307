// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod live;

use axum::{
    Json, Router,
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use clap::Parser;
use residuals::DEFAULT_FAILURE_THRESHOLD;
use residuals_api::{
    ApiError, AuditRunResponse, CoordinatorConfig, DEFAULT_TIMEZONE, DEFAULT_TRAILING_MONTHS,
    DEFAULT_UPCOMING_MONTHS, FailingSource, PeriodsResponse, PipelineCoordinator,
    PipelineViewResponse, RunAuditRequest, SelectPeriodRequest, list_periods, parse_period,
    parse_stage,
};
use residuals_domain::{AuditRunResult, PeriodKey, StageId};
use residuals_upstream::{HttpBackend, InMemoryBackend, ResidualsBackend, UpstreamError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Residuals Server - HTTP server for the monthly residuals pipeline
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to bind the server to
    #[arg(short, long, env = "RESIDUALS_PORT", default_value_t = 3000)]
    port: u16,

    /// Base URL of the back-office residuals API. If not provided, uses an
    /// in-memory backend.
    #[arg(long, env = "RESIDUALS_UPSTREAM_URL")]
    upstream_url: Option<String>,

    /// Bearer token for the back-office API
    #[arg(long, env = "RESIDUALS_API_TOKEN", default_value = "", hide_env_values = true)]
    api_token: String,

    /// Per-request timeout for the back-office API, in seconds
    #[arg(long, env = "RESIDUALS_UPSTREAM_TIMEOUT_SECS", default_value_t = 15)]
    upstream_timeout_secs: u64,

    /// Seconds between polls while the pipeline is not complete
    #[arg(long, env = "RESIDUALS_POLL_INTERVAL_SECS", default_value_t = 5)]
    poll_interval_secs: u64,

    /// Consecutive fetch failures before the stale warning escalates
    #[arg(long, env = "RESIDUALS_FAILURE_THRESHOLD", default_value_t = DEFAULT_FAILURE_THRESHOLD)]
    failure_threshold: u32,

    /// Selectable months before the current one
    #[arg(long, env = "RESIDUALS_TRAILING_MONTHS", default_value_t = DEFAULT_TRAILING_MONTHS)]
    trailing_months: u32,

    /// Selectable months after the current one
    #[arg(long, env = "RESIDUALS_UPCOMING_MONTHS", default_value_t = DEFAULT_UPCOMING_MONTHS)]
    upcoming_months: u32,

    /// IANA time zone that decides the current month
    #[arg(long, env = "RESIDUALS_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    timezone: String,
}

impl Args {
    fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            failure_escalation_threshold: self.failure_threshold,
            trailing_months: self.trailing_months,
            upcoming_months: self.upcoming_months,
            timezone: self.timezone.clone(),
        }
    }

    fn backend(&self) -> Result<Arc<dyn ResidualsBackend>, UpstreamError> {
        if let Some(url) = &self.upstream_url {
            info!(url = %url, "Using back-office residuals API");
            let backend: Arc<dyn ResidualsBackend> = Arc::new(HttpBackend::new(
                url,
                &self.api_token,
                Duration::from_secs(self.upstream_timeout_secs),
            )?);
            Ok(backend)
        } else {
            info!("No upstream URL configured, using in-memory backend");
            let backend: Arc<dyn ResidualsBackend> = Arc::new(InMemoryBackend::new());
            Ok(backend)
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The pipeline coordinator. Clones share one coordinator.
    coordinator: PipelineCoordinator,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
    /// Sources that failed an audit run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    failing_sources: Vec<FailingSource>,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
    /// Sources that failed an audit run.
    failing_sources: Vec<FailingSource>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
            failing_sources: self.failing_sources,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::NoActivePeriod | ApiError::StageLocked { .. } => StatusCode::CONFLICT,
            ApiError::SnapshotUnavailable { .. } | ApiError::ShutDown => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::AuditRunFailed { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message: String = err.to_string();
        let failing_sources: Vec<FailingSource> = match err {
            ApiError::AuditRunFailed {
                failing_sources, ..
            } => failing_sources,
            _ => Vec::new(),
        };

        Self {
            status,
            message,
            failing_sources,
        }
    }
}

/// Handler for GET `/periods` endpoint.
///
/// Lists the periods an operator may select.
async fn handle_list_periods(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<PeriodsResponse>, HttpError> {
    let coordinator: &PipelineCoordinator = &app_state.coordinator;
    let response: PeriodsResponse =
        list_periods(coordinator.config(), coordinator.view().period, Utc::now())?;
    Ok(Json(response))
}

/// Handler for GET `/pipeline` endpoint.
async fn handle_get_pipeline(
    AxumState(app_state): AxumState<AppState>,
) -> Json<PipelineViewResponse> {
    Json((&app_state.coordinator.view()).into())
}

/// Handler for POST `/pipeline/period` endpoint.
///
/// Switches the active period. Returns immediately; the first snapshot for
/// the new period arrives through `/pipeline/live` or a later GET.
async fn handle_select_period(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<SelectPeriodRequest>,
) -> Result<Json<PipelineViewResponse>, HttpError> {
    info!(period = %req.period, "Handling select_period request");

    let period: PeriodKey = parse_period(&req.period)?;
    let view = app_state.coordinator.select_period(period).await?;
    Ok(Json((&view).into()))
}

/// Handler for POST `/pipeline/refresh` endpoint.
///
/// Fetches the active period now and waits for the result.
async fn handle_refresh(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<PipelineViewResponse>, HttpError> {
    info!("Handling refresh request");

    let view = app_state.coordinator.refresh().await?;
    Ok(Json((&view).into()))
}

/// Handler for POST `/pipeline/audit` endpoint.
///
/// Runs the audit for a period and returns the refreshed view.
async fn handle_run_audit(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RunAuditRequest>,
) -> Result<Json<AuditRunResponse>, HttpError> {
    info!(period = %req.period, "Handling run_audit request");

    let period: PeriodKey = parse_period(&req.period)?;
    let run: AuditRunResult = app_state.coordinator.run_audit(period).await?;

    Ok(Json(AuditRunResponse {
        run,
        view: (&app_state.coordinator.view()).into(),
    }))
}

/// Handler for POST `/pipeline/stages/{stage}/toggle` endpoint.
///
/// Expands or collapses a stage's detail panel.
async fn handle_toggle_stage(
    AxumState(app_state): AxumState<AppState>,
    Path(stage): Path<String>,
) -> Result<Json<PipelineViewResponse>, HttpError> {
    let stage: StageId = parse_stage(&stage)?;
    let view = app_state.coordinator.toggle_stage_view(stage).await?;
    Ok(Json((&view).into()))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/periods", get(handle_list_periods))
        .route("/pipeline", get(handle_get_pipeline))
        .route("/pipeline/period", post(handle_select_period))
        .route("/pipeline/refresh", post(handle_refresh))
        .route("/pipeline/audit", post(handle_run_audit))
        .route("/pipeline/stages/{stage}/toggle", post(handle_toggle_stage))
        .route("/pipeline/live", get(live::live_pipeline_handler))
        .with_state(app_state)
}

/// Resolves on Ctrl-C, then stops the coordinator.
async fn shutdown_signal(coordinator: PipelineCoordinator) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received");
    coordinator.shutdown().await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Residuals Server");

    let backend: Arc<dyn ResidualsBackend> = args.backend()?;
    let coordinator: PipelineCoordinator =
        PipelineCoordinator::new(backend, args.coordinator_config())?;

    let app_state: AppState = AppState {
        coordinator: coordinator.clone(),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(coordinator))
        .await?;

    Ok(())
}
