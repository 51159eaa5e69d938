//! Error taxonomy for the serving layer
//!
//! Load failures abort startup, validation failures become 422 responses,
//! prediction failures become 500 responses.

use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a model artifact at startup
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model '{name}': artifact not found at {path:?}")]
    Missing { name: String, path: PathBuf },

    #[error("model '{name}': failed to read {path:?}: {source}")]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model '{name}': unsupported artifact format {path:?}")]
    UnsupportedFormat { name: String, path: PathBuf },

    #[error("model '{name}': artifact does not expose a usable predictor: {reason}")]
    InvalidModel { name: String, reason: String },

    #[error("model '{name}': checksum mismatch (expected {expected}, got {actual})")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("model '{0}' is already loaded")]
    Duplicate(String),
}

/// Lookup of a model name that was never loaded
#[derive(Debug, Error)]
#[error("model '{0}' is not loaded")]
pub struct NotFoundError(pub String);

/// Failure inside a prediction call
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("feature {index} is not finite ({value})")]
    NonFiniteFeature { index: usize, value: f64 },

    #[error("model returned a non-finite value ({0})")]
    NonFiniteOutput(f64),

    #[error("model returned no output")]
    EmptyOutput,

    #[error("inference failed: {0}")]
    Backend(String),
}

impl PredictionError {
    /// False when the request was refused before the model ran
    pub fn is_model_fault(&self) -> bool {
        !matches!(self, PredictionError::NonFiniteFeature { .. })
    }
}

/// One offending input location, shaped like the de-facto standard
/// validation error object (`type`, `loc`, `msg`, `input`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub loc: Vec<Value>,
    pub msg: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Value>,
}

impl FieldError {
    /// Error located at a named body field
    pub fn at_field(field: &str, kind: &'static str, msg: impl Into<String>, input: Value) -> Self {
        Self {
            kind,
            loc: vec![Value::from("body"), Value::from(field)],
            msg: msg.into(),
            input,
            ctx: None,
        }
    }

    /// Error located at the body as a whole
    pub fn at_body(kind: &'static str, msg: impl Into<String>, input: Value) -> Self {
        Self {
            kind,
            loc: vec![Value::from("body")],
            msg: msg.into(),
            input,
            ctx: None,
        }
    }

    pub fn with_ctx(mut self, ctx: Value) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Name of the offending field, if the error points at one
    pub fn field(&self) -> Option<&str> {
        self.loc.get(1).and_then(Value::as_str)
    }
}

/// Rejected request body, listing every offending field
#[derive(Debug, Clone, Error, Serialize)]
#[error("request validation failed ({} error(s))", .detail.len())]
pub struct ValidationError {
    pub detail: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(error: FieldError) -> Self {
        Self {
            detail: vec![error],
        }
    }
}

/// Outcome of a failed dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}
