//! Crop recommendation pipeline: load a historical crop/environment CSV,
//! resolve its columns by semantic role, train-or-load a depth-bounded
//! decision tree, and recommend a crop for a set of environment
//! parameters.

pub mod dataset;
pub mod error;
pub mod model;
pub mod predictor;
pub mod roles;
pub mod store;
pub mod types;

pub use dataset::{Cell, Dataset};
pub use error::{LoadError, PipelineError};
pub use model::CropModel;
pub use predictor::Predictor;
pub use roles::{Role, RoleMap};
pub use store::{ArtifactStatus, ModelStore};
pub use types::{EnvInputs, Recommendation};
