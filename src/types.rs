//! Request and response types for a single recommendation.

use serde::Serialize;

use crate::error::PipelineError;
use crate::roles::Role;

/// Environment parameters for one recommendation request. Ranges match
/// the interactive controls; edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvInputs {
    pub month: i64,
    pub temperature: i64,
    pub rainfall: i64,
    pub ph: f64,
}

impl EnvInputs {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(1..=12).contains(&self.month) {
            return Err(out_of_range("month", self.month.to_string(), "1..=12"));
        }
        if !(0..=40).contains(&self.temperature) {
            return Err(out_of_range(
                "temperature",
                self.temperature.to_string(),
                "0..=40",
            ));
        }
        if !(0..=2000).contains(&self.rainfall) {
            return Err(out_of_range(
                "rainfall",
                self.rainfall.to_string(),
                "0..=2000",
            ));
        }
        if !(3.0..=9.0).contains(&self.ph) {
            return Err(out_of_range("ph", self.ph.to_string(), "3.0..=9.0"));
        }
        Ok(())
    }

    /// Feature value for a role. Inference is keyed by role, never by
    /// position.
    pub fn value_for(&self, role: Role) -> Result<f64, PipelineError> {
        match role {
            Role::Month => Ok(self.month as f64),
            Role::Temperature => Ok(self.temperature as f64),
            Role::Rainfall => Ok(self.rainfall as f64),
            Role::Ph => Ok(self.ph),
            Role::Crop => Err(PipelineError::Prediction(
                "the crop label is not an input feature".into(),
            )),
        }
    }
}

fn out_of_range(field: &'static str, value: String, range: &'static str) -> PipelineError {
    PipelineError::InvalidInput {
        field,
        value,
        range,
    }
}

/// A predicted crop plus the descriptive fields of the first dataset
/// record carrying that label.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub crop: String,
    pub suitable_temperature: String,
    pub water_need: String,
    pub best_ph: String,
    pub common_issues: Option<String>,
    pub yield_grade: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> EnvInputs {
        EnvInputs {
            month: 5,
            temperature: 25,
            rainfall: 800,
            ph: 6.5,
        }
    }

    #[test]
    fn range_edges_are_inclusive() {
        for inputs in [
            EnvInputs { month: 1, ..inputs() },
            EnvInputs { month: 12, ..inputs() },
            EnvInputs { temperature: 0, ..inputs() },
            EnvInputs { temperature: 40, ..inputs() },
            EnvInputs { rainfall: 0, ..inputs() },
            EnvInputs { rainfall: 2000, ..inputs() },
            EnvInputs { ph: 3.0, ..inputs() },
            EnvInputs { ph: 9.0, ..inputs() },
        ] {
            inputs.validate().unwrap();
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for (inputs, field) in [
            (EnvInputs { month: 0, ..inputs() }, "month"),
            (EnvInputs { month: 13, ..inputs() }, "month"),
            (EnvInputs { temperature: -1, ..inputs() }, "temperature"),
            (EnvInputs { temperature: 41, ..inputs() }, "temperature"),
            (EnvInputs { rainfall: -1, ..inputs() }, "rainfall"),
            (EnvInputs { rainfall: 2001, ..inputs() }, "rainfall"),
            (EnvInputs { ph: 2.9, ..inputs() }, "ph"),
            (EnvInputs { ph: 9.1, ..inputs() }, "ph"),
        ] {
            match inputs.validate().unwrap_err() {
                PipelineError::InvalidInput { field: f, .. } => assert_eq!(f, field),
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
