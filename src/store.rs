//! Persistence of the trained model as a single bincode blob.
//!
//! The artifact's state is checked explicitly through `status()` rather
//! than probing for file-not-found at load time.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::PipelineError;
use crate::model::{CropModel, FORMAT_VERSION};
use crate::roles::Role;

/// Tri-state of the persisted artifact.
#[derive(Debug)]
pub enum ArtifactStatus {
    /// No artifact file exists.
    Absent,
    /// An artifact exists but cannot be used; the reason says why.
    Stale(String),
    /// A compatible model, ready to predict.
    Present(CropModel),
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> Result<ArtifactStatus, PipelineError> {
        if !self.path.exists() {
            return Ok(ArtifactStatus::Absent);
        }

        let bytes = fs::read(&self.path).map_err(|e| {
            PipelineError::Store(format!(
                "failed to read model artifact {}: {e}",
                self.path.display()
            ))
        })?;

        let model: CropModel = match bincode::deserialize(&bytes) {
            Ok(model) => model,
            Err(e) => {
                return Ok(ArtifactStatus::Stale(format!(
                    "artifact does not deserialize: {e}"
                )))
            }
        };
        if model.version != FORMAT_VERSION {
            return Ok(ArtifactStatus::Stale(format!(
                "artifact format v{} does not match v{FORMAT_VERSION}",
                model.version
            )));
        }
        if model.feature_roles() != Role::FEATURES {
            return Ok(ArtifactStatus::Stale(
                "artifact was trained with a different feature-role order".into(),
            ));
        }

        Ok(ArtifactStatus::Present(model))
    }

    /// Writes the serialized model, overwriting any prior artifact.
    pub fn save(&self, model: &CropModel) -> Result<(), PipelineError> {
        let bytes = bincode::serialize(model)
            .map_err(|e| PipelineError::Store(format!("failed to serialize model: {e}")))?;
        fs::write(&self.path, bytes).map_err(|e| {
            PipelineError::Store(format!(
                "failed to write model artifact {}: {e}",
                self.path.display()
            ))
        })?;
        info!(path = %self.path.display(), "model artifact written");
        Ok(())
    }
}
