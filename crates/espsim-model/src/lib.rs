//! Feature descriptor model for the ESP32 project simulator.
//!
//! This crate turns what a user asked for into something the simulator can run.
//!
//! # Components
//!
//! - [`SimulateRequest`] / [`FeatureRequest`]: raw requests as they arrive in JSON or YAML
//! - [`ProjectManifest`]: feature list stored next to a generated project
//! - [`params`]: per-capability parameter schemas and defaults
//! - [`validate`]: the pure request validator
//! - [`FeatureDescriptor`]: the validated, normalized result
//!
//! # Example
//!
//! ```rust,ignore
//! use espsim_model::{load_request, validate};
//!
//! let request = load_request("demos/descriptors/espcomms.yaml")?;
//! let descriptor = request.validate()?;
//! for cap in descriptor.capabilities() {
//!     println!("{}", cap);
//! }
//! ```

pub mod descriptor;
pub mod error;
pub mod params;
pub mod request;
mod validate;

pub use descriptor::{
    project_slug, BlePeripheralConfig, CapabilityConfig, FeatureDescriptor, HttpServerConfig,
    MqttClientConfig, TcpServerConfig, WifiApConfig, WifiStaConfig,
};
pub use error::{ModelError, ValidationError, ValidationErrorKind};
pub use params::{param_def, schema, ParamDef, ParamType, ParamValue};
pub use request::{FeatureRequest, FeatureSpec, ProjectManifest, SimulateRequest, DEFAULT_BOARD_TYPE};
pub use validate::{validate, validate_project_name, MAX_PROJECT_NAME_LEN};

use std::path::Path;
use tracing::debug;

// ============================================================================
// Loading
// ============================================================================

/// Load a simulate request from a YAML (or JSON) file.
pub fn load_request(path: impl AsRef<Path>) -> Result<SimulateRequest, ModelError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading simulate request");
    let content = std::fs::read_to_string(path)?;
    load_request_from_str(&content)
}

/// Parse a simulate request from a YAML (or JSON) string.
pub fn load_request_from_str(content: &str) -> Result<SimulateRequest, ModelError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Load a project manifest from a YAML file.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<ProjectManifest, ModelError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading project manifest");
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Load a request file and validate it in one step.
///
/// The file must carry its features inline.
pub fn load_descriptor(path: impl AsRef<Path>) -> Result<FeatureDescriptor, ModelError> {
    let request = load_request(path)?;
    Ok(request.validate()?)
}
