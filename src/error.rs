use thiserror::Error;

use crate::roles::Role;

/// Fatal dataset-load failures. The interactive session cannot start
/// without a dataset, so callers halt and surface the diagnostic.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse dataset file {path}; tried encodings: {}", tried.join(", "))]
    Undecodable { path: String, tried: Vec<&'static str> },
}

/// Request-level and setup failures past the load stage. `MissingColumn`
/// is fatal before training; the rest are reported once per request and
/// the session continues.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no column found for role {role}; tried aliases: {}", tried.join(", "))]
    MissingColumn {
        role: Role,
        tried: &'static [&'static str],
    },

    #[error("{field} = {value} is outside the allowed range {range}")]
    InvalidInput {
        field: &'static str,
        value: String,
        range: &'static str,
    },

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("no dataset record describes predicted crop \"{0}\"")]
    NoDescription(String),

    #[error("model store failure: {0}")]
    Store(String),
}
