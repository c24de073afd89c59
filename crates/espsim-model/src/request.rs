//! Raw simulate requests and project manifests, as they arrive over the wire.
//!
//! Unknown keys are rejected at every level, so a misspelled field is an error
//! rather than a silent fallback to its default.

use crate::params::ParamValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Board used when neither the request nor the project manifest names one.
pub const DEFAULT_BOARD_TYPE: &str = "esp32";

/// A request to simulate one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulateRequest {
    /// Project name as entered by the user.
    pub project_name: String,
    /// Board identifier (`esp32`, `esp32-c3`, ...). When absent, the manifest's
    /// board is used for catalog lookups, then [`DEFAULT_BOARD_TYPE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_type: Option<String>,
    /// Inline feature list. When absent, the service looks the project up in
    /// its catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<FeatureRequest>>,
}

impl SimulateRequest {
    /// Create a request with no board and no inline features.
    pub fn new(project_name: impl Into<String>) -> Self {
        SimulateRequest {
            project_name: project_name.into(),
            board_type: None,
            features: None,
        }
    }

    /// Set the board identifier.
    pub fn with_board(mut self, board_type: impl Into<String>) -> Self {
        self.board_type = Some(board_type.into());
        self
    }

    /// Append an inline feature.
    pub fn with_feature(mut self, feature: FeatureRequest) -> Self {
        self.features.get_or_insert_with(Vec::new).push(feature);
        self
    }

    /// The board to simulate on, falling back to [`DEFAULT_BOARD_TYPE`].
    pub fn board_name(&self) -> &str {
        self.board_type.as_deref().unwrap_or(DEFAULT_BOARD_TYPE)
    }

    /// Fill in the features and board of a stored project manifest.
    ///
    /// An explicit board on the request wins over the manifest's.
    pub fn with_manifest(mut self, manifest: ProjectManifest) -> Self {
        if self.board_type.is_none() {
            self.board_type = manifest.board_type;
        }
        self.features = Some(manifest.features);
        self
    }
}

/// One requested capability, either bare (`"tcp_server"`) or with parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureRequest {
    /// Capability name only; every parameter takes its default.
    Name(String),
    /// Capability name with explicit parameters.
    Detailed(FeatureSpec),
}

/// The `{name, params}` form of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureSpec {
    /// Capability name.
    pub name: String,
    /// Parameter values keyed by parameter name.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl FeatureRequest {
    /// A bare capability request.
    pub fn named(name: impl Into<String>) -> Self {
        FeatureRequest::Name(name.into())
    }

    /// A capability request with parameters.
    pub fn with_params<K, V, I>(name: impl Into<String>, params: I) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        FeatureRequest::Detailed(FeatureSpec {
            name: name.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        })
    }

    /// The requested capability name.
    pub fn name(&self) -> &str {
        match self {
            FeatureRequest::Name(name) => name,
            FeatureRequest::Detailed(spec) => &spec.name,
        }
    }

    /// The supplied parameters, if any.
    pub fn params(&self) -> Option<&BTreeMap<String, ParamValue>> {
        match self {
            FeatureRequest::Name(_) => None,
            FeatureRequest::Detailed(spec) => Some(&spec.params),
        }
    }
}

/// Feature manifest written by the project builder next to a generated project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    /// Board the project was generated for. Used when the request names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_type: Option<String>,
    /// Declared features.
    pub features: Vec<FeatureRequest>,
}
