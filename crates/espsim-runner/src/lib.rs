//! # espsim-runner
//!
//! Simulation engine and service for the ESP32 project simulator.
//!
//! ## Components
//!
//! - [`session`]: [`DeviceSession`], one simulated board
//! - [`scheduler`]: the bounded tick loop
//! - [`report`]: [`SimulationReport`], the externally visible result
//! - [`catalog`]: stored project manifests
//! - [`config`]: service configuration
//! - [`server`]: the axum router behind `espsim serve`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use espsim_model::{FeatureRequest, SimulateRequest};
//!
//! let request = SimulateRequest::new("Comms Hub")
//!     .with_feature(FeatureRequest::named("wifi_ap"))
//!     .with_feature(FeatureRequest::named("tcp_server"));
//! let report = espsim_runner::simulate(&request, espsim_runner::DEFAULT_MAX_TICKS)?;
//! assert!(report.is_success());
//! ```

pub mod catalog;
pub mod config;
pub mod report;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod telemetry;

pub use catalog::{CatalogError, DirectoryCatalog, ProjectCatalog};
pub use config::{ConfigError, ServiceConfig};
pub use report::{ReportStatus, SimulationReport};
pub use scheduler::DEFAULT_MAX_TICKS;
pub use session::{DeviceSession, SessionId};

use espsim_model::{FeatureDescriptor, SimulateRequest, ValidationError};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while running the simulator.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Request loading or validation error.
    #[error("Model error: {0}")]
    Model(#[from] espsim_model::ModelError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Project catalog error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

// ============================================================================
// Pipeline
// ============================================================================

/// Run a validated descriptor and build its report.
pub fn simulate_descriptor(descriptor: FeatureDescriptor, max_ticks: u32) -> SimulationReport {
    let session = scheduler::run(DeviceSession::new(descriptor), max_ticks);
    let report = report::build(&session);
    telemetry::record_run(&session, &report);
    report
}

/// Validate a request with inline features, run it and build its report.
pub fn simulate(request: &SimulateRequest, max_ticks: u32) -> Result<SimulationReport, ValidationError> {
    let descriptor = request.validate().inspect_err(telemetry::record_rejection)?;
    Ok(simulate_descriptor(descriptor, max_ticks))
}
