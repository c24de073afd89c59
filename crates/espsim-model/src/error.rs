//! Error types for descriptor validation and loading.

use espsim_common::Capability;
use serde::Serialize;
use thiserror::Error;

/// Machine-readable validation error kind, surfaced at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationErrorKind {
    /// A capability name outside the vocabulary.
    UnknownCapability,
    /// Two capabilities that cannot be enabled together.
    ConflictingCapabilities,
    /// A malformed or out-of-range field.
    InvalidParameter,
}

impl ValidationErrorKind {
    /// The kind as it appears in error responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::UnknownCapability => "UnknownCapability",
            ValidationErrorKind::ConflictingCapabilities => "ConflictingCapabilities",
            ValidationErrorKind::InvalidParameter => "InvalidParameter",
        }
    }
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that cannot be turned into a feature descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Capability name outside the vocabulary.
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// Two capabilities that cannot be simulated on one radio.
    #[error("Conflicting capabilities: {first} and {second} cannot be enabled together")]
    ConflictingCapabilities {
        /// First capability of the pair, in canonical order.
        first: Capability,
        /// Second capability of the pair.
        second: Capability,
    },

    /// A field failed its schema.
    #[error("Invalid parameter '{}': {reason}", qualified_field(.capability, .field))]
    InvalidParameter {
        /// Capability the parameter belongs to, if any.
        capability: Option<Capability>,
        /// Offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

fn qualified_field(capability: &Option<Capability>, field: &str) -> String {
    match capability {
        Some(cap) => format!("{}.{}", cap, field),
        None => field.to_string(),
    }
}

impl ValidationError {
    /// An invalid request-level field.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidParameter {
            capability: None,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// An invalid capability parameter.
    pub fn invalid_param(
        capability: Capability,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ValidationError::InvalidParameter {
            capability: Some(capability),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The machine-readable kind.
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::UnknownCapability(_) => ValidationErrorKind::UnknownCapability,
            ValidationError::ConflictingCapabilities { .. } => {
                ValidationErrorKind::ConflictingCapabilities
            }
            ValidationError::InvalidParameter { .. } => ValidationErrorKind::InvalidParameter,
        }
    }

    /// The capability the error is attributed to, if any.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            ValidationError::UnknownCapability(_) => None,
            ValidationError::ConflictingCapabilities { first, .. } => Some(*first),
            ValidationError::InvalidParameter { capability, .. } => *capability,
        }
    }

    /// The offending field name, if the error names one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidParameter { field, .. } => Some(field),
            ValidationError::UnknownCapability(_)
            | ValidationError::ConflictingCapabilities { .. } => Some("features"),
        }
    }
}

/// Errors that can occur while loading a request or manifest from disk.
#[derive(Debug, Error)]
pub enum ModelError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (or JSON) parse error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The request was parsed but is not valid.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}
