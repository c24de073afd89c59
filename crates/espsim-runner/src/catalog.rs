//! Project catalog.
//!
//! When a simulate request carries no feature list, the service asks the
//! catalog for the manifest the project builder stored with the generated
//! project.

use espsim_model::{project_slug, ProjectManifest};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Manifest file name inside a project directory.
pub const MANIFEST_FILE: &str = "espsim.yaml";

/// Errors reading from a project catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The manifest exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The manifest is not valid YAML.
    #[error("Invalid manifest {}: {source}", path.display())]
    Manifest {
        /// Manifest path.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml::Error,
    },
}

/// Source of stored project manifests.
pub trait ProjectCatalog: Send + Sync {
    /// Manifest of a project, or `None` if the catalog does not know it.
    fn manifest(&self, project_name: &str) -> Result<Option<ProjectManifest>, CatalogError>;
}

/// Catalog backed by the project builder's output directory.
///
/// Project `Cat Camera` is read from `<root>/cat_camera/espsim.yaml`.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    /// Catalog rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryCatalog { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Manifest path of a project, if its name maps to a safe directory name.
    pub fn manifest_path(&self, project_name: &str) -> Option<PathBuf> {
        let slug = project_slug(project_name);
        let safe = !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        safe.then(|| self.root.join(slug).join(MANIFEST_FILE))
    }
}

impl ProjectCatalog for DirectoryCatalog {
    fn manifest(&self, project_name: &str) -> Result<Option<ProjectManifest>, CatalogError> {
        let Some(path) = self.manifest_path(project_name) else {
            return Ok(None);
        };
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no manifest for project");
                return Ok(None);
            }
            Err(source) => return Err(CatalogError::Io { path, source }),
        };
        let manifest: ProjectManifest = serde_yaml::from_str(&content)
            .map_err(|source| CatalogError::Manifest {
                path: path.clone(),
                source,
            })?;
        debug!(
            path = %path.display(),
            features = manifest.features.len(),
            board = manifest.board_type.as_deref().unwrap_or("-"),
            "loaded project manifest"
        );
        Ok(Some(manifest))
    }
}
