//! The single-call recommendation pipeline: reuse-or-train the model,
//! predict a crop for one set of environment inputs, and describe it
//! from the dataset.

use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::model::CropModel;
use crate::roles::{Role, RoleMap, ISSUES_ALIASES, YIELD_ALIASES};
use crate::store::{ArtifactStatus, ModelStore};
use crate::types::{EnvInputs, Recommendation};

pub struct Predictor {
    dataset: Dataset,
    roles: RoleMap,
    store: ModelStore,
}

impl Predictor {
    /// Resolves the role map up front; an unresolvable role fails here,
    /// before any training can happen.
    pub fn new(dataset: Dataset, store: ModelStore) -> Result<Predictor, PipelineError> {
        let roles = RoleMap::resolve(&dataset)?;
        Ok(Predictor {
            dataset,
            roles,
            store,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn roles(&self) -> &RoleMap {
        &self.roles
    }

    /// Reuses the persisted model when present; trains and persists one
    /// when the artifact is absent or stale.
    pub fn ensure_model(&self) -> Result<CropModel, PipelineError> {
        match self.store.status()? {
            ArtifactStatus::Present(model) => Ok(model),
            ArtifactStatus::Absent => {
                info!("no model artifact found; training");
                self.train_and_persist()
            }
            ArtifactStatus::Stale(reason) => {
                warn!(reason = %reason, "stale model artifact; retraining");
                self.train_and_persist()
            }
        }
    }

    fn train_and_persist(&self) -> Result<CropModel, PipelineError> {
        let model = CropModel::train(&self.dataset, &self.roles)?;
        self.store.save(&model)?;
        Ok(model)
    }

    /// Runs one full recommendation request. Failures are returned to the
    /// caller once; nothing here retries.
    pub fn recommend(&self, inputs: &EnvInputs) -> Result<Recommendation, PipelineError> {
        inputs.validate()?;
        let model = self.ensure_model()?;
        let crop = model.predict(inputs)?;
        info!(crop = %crop, "prediction complete");
        self.describe(&crop)
    }

    /// Descriptive fields from the first dataset record carrying the
    /// predicted label. First match wins when records disagree.
    fn describe(&self, crop: &str) -> Result<Recommendation, PipelineError> {
        let crop_column = self.roles.column(Role::Crop);
        let row = (0..self.dataset.len())
            .find(|&r| {
                self.dataset
                    .value(r, crop_column)
                    .is_some_and(|cell| cell.to_string() == crop)
            })
            .ok_or_else(|| PipelineError::NoDescription(crop.to_string()))?;

        let field = |role: Role| {
            self.dataset
                .value(row, self.roles.column(role))
                .map(|cell| cell.to_string())
                .unwrap_or_default()
        };
        let extra = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|name| self.dataset.value(row, name))
                .map(|cell| cell.to_string())
        };

        Ok(Recommendation {
            crop: crop.to_string(),
            suitable_temperature: field(Role::Temperature),
            water_need: field(Role::Rainfall),
            best_ph: field(Role::Ph),
            common_issues: extra(ISSUES_ALIASES),
            yield_grade: extra(YIELD_ALIASES),
        })
    }
}
