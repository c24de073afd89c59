//! HTTP boundary of the simulation service.
//!
//! Routes:
//! - `GET /api/health`
//! - `GET /api/capabilities`: parameter schema of every capability
//! - `POST /api/simulate`: validate, run and report
//!
//! The engine itself is synchronous. Each simulate request runs on the blocking
//! pool together with its catalog lookup, so handlers never block the runtime.

use crate::catalog::{CatalogError, DirectoryCatalog, ProjectCatalog};
use crate::config::ServiceConfig;
use crate::report::SimulationReport;
use crate::{simulate_descriptor, telemetry, RunnerError};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use espsim_common::Capability;
use espsim_model::{schema, validate_project_name, ParamDef, SimulateRequest, ValidationError};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "espsim";

const ROUTE_HEALTH: &str = "/api/health";
const ROUTE_CAPABILITIES: &str = "/api/capabilities";
const ROUTE_SIMULATE: &str = "/api/simulate";

// ============================================================================
// State
// ============================================================================

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    catalog: Arc<dyn ProjectCatalog>,
    max_ticks: u32,
}

impl AppState {
    /// State with an explicit catalog.
    pub fn new(catalog: Arc<dyn ProjectCatalog>, max_ticks: u32) -> Self {
        AppState { catalog, max_ticks }
    }

    /// State for a service configuration, reading projects from `projects_path`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            Arc::new(DirectoryCatalog::new(config.projects_path.clone())),
            config.max_ticks,
        )
    }
}

// ============================================================================
// Errors
// ============================================================================

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    capability: Option<Capability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorBody {
            error: error.into(),
            message: message.into(),
            capability: None,
            field: None,
        }
    }
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// The request failed validation.
    Validation(ValidationError),
    /// No inline features and no manifest for the project.
    ProjectNotFound(String),
    /// The catalog could not be read.
    Catalog(CatalogError),
    /// The body is not a well-formed request.
    BadRequest(String),
    /// The simulation task did not complete.
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Catalog(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(err) => ErrorBody {
                error: err.kind().as_str().to_string(),
                message: err.to_string(),
                capability: err.capability(),
                field: err.field().map(str::to_string),
            },
            ApiError::ProjectNotFound(name) => ErrorBody::new(
                "ProjectNotFound",
                format!("no features given and no manifest found for project '{}'", name),
            ),
            ApiError::Catalog(err) => ErrorBody::new("CatalogError", err.to_string()),
            ApiError::BadRequest(message) => ErrorBody::new("InvalidRequest", message.clone()),
            ApiError::Internal(message) => ErrorBody::new("InternalError", message.clone()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = ?self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(ROUTE_HEALTH, get(health))
        .route(ROUTE_CAPABILITIES, get(capabilities))
        .route(ROUTE_SIMULATE, post(simulate))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthBody> {
    telemetry::record_http(ROUTE_HEALTH, StatusCode::OK.as_u16());
    Json(HealthBody {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

/// One entry of the capability listing.
#[derive(Debug, Serialize)]
pub struct CapabilitySchema {
    /// Capability name.
    pub capability: Capability,
    /// Accepted parameters.
    pub parameters: &'static [ParamDef],
}

/// The parameter schema of every capability, in canonical order.
pub fn capability_schemas() -> Vec<CapabilitySchema> {
    Capability::ALL
        .iter()
        .map(|&capability| CapabilitySchema {
            capability,
            parameters: schema(capability),
        })
        .collect()
}

async fn capabilities() -> Json<Vec<CapabilitySchema>> {
    telemetry::record_http(ROUTE_CAPABILITIES, StatusCode::OK.as_u16());
    Json(capability_schemas())
}

async fn simulate(
    State(app): State<AppState>,
    payload: Result<Json<SimulateRequest>, JsonRejection>,
) -> Result<Json<SimulationReport>, ApiError> {
    let result = match payload {
        Ok(Json(request)) => run_request(app, request).await,
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    };
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(err) => err.status(),
    };
    telemetry::record_http(ROUTE_SIMULATE, status.as_u16());
    result.map(Json)
}

async fn run_request(app: AppState, request: SimulateRequest) -> Result<SimulationReport, ApiError> {
    tokio::task::spawn_blocking(move || simulate_blocking(&app, request))
        .await
        .map_err(|err| ApiError::Internal(format!("simulation task failed: {}", err)))?
}

fn simulate_blocking(app: &AppState, request: SimulateRequest) -> Result<SimulationReport, ApiError> {
    let request = match request.features {
        Some(_) => request,
        None => {
            let name = validate_project_name(&request.project_name).inspect_err(telemetry::record_rejection)?;
            match app.catalog.manifest(&name)? {
                Some(manifest) => request.with_manifest(manifest),
                None => {
                    warn!(project = %name, "project not found in catalog");
                    return Err(ApiError::ProjectNotFound(name));
                }
            }
        }
    };

    let descriptor = request.validate().inspect_err(telemetry::record_rejection)?;
    info!(
        project = %descriptor.project_name(),
        board = %descriptor.board(),
        "simulating project"
    );
    Ok(simulate_descriptor(descriptor, app.max_ticks))
}

// ============================================================================
// Serving
// ============================================================================

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServiceConfig) -> Result<(), RunnerError> {
    config.validate()?;
    let router = build_router(AppState::from_config(&config));
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        address = %config.bind_address(),
        projects = %config.projects_path.display(),
        max_ticks = config.max_ticks,
        "simulation service listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("simulation service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
    }
}
