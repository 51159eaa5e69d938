//! Model registry
//!
//! Models are loaded from disk once at startup through a [`RegistryBuilder`].
//! Building yields a [`ModelRegistry`] that has no mutating methods, so the
//! set of loaded models is frozen for the rest of the process.

use crate::error::{LoadError, NotFoundError};
use crate::predictor::{LinearPredictor, OnnxPredictor, Predictor};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Shared handle to a loaded model
pub type PredictorHandle = Arc<dyn Predictor>;

/// Where to load one logical model from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    pub name: String,
    pub path: PathBuf,
    /// Hex SHA-256 the artifact must match, if pinned
    pub expected_sha256: Option<String>,
}

impl ModelSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            expected_sha256: None,
        }
    }

    pub fn with_checksum(mut self, sha256: impl Into<String>) -> Self {
        self.expected_sha256 = Some(sha256.into());
        self
    }
}

/// Facts about a successfully loaded model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModel {
    pub name: String,
    pub kind: &'static str,
    pub path: PathBuf,
    pub sha256: String,
}

/// Artifact formats the registry can deserialize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactFormat {
    Onnx,
    LinearJson,
}

impl ArtifactFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "onnx" => Some(Self::Onnx),
            "json" => Some(Self::LinearJson),
            _ => None,
        }
    }
}

/// Read-only map from logical model name to predictor
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, PredictorHandle>,
}

impl ModelRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Result<PredictorHandle, NotFoundError> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| NotFoundError(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Loaded model names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.names())
            .finish()
    }
}

/// Startup-time accumulator for [`ModelRegistry`]
#[derive(Default)]
pub struct RegistryBuilder {
    models: HashMap<String, PredictorHandle>,
}

impl RegistryBuilder {
    /// Load an artifact from disk and register it under its logical name
    pub fn load(&mut self, source: &ModelSource) -> Result<LoadedModel, LoadError> {
        if self.models.contains_key(&source.name) {
            return Err(LoadError::Duplicate(source.name.clone()));
        }

        let (predictor, loaded) = load_artifact(source)?;
        self.models.insert(source.name.clone(), predictor);
        Ok(loaded)
    }

    /// Register an already constructed predictor
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        predictor: PredictorHandle,
    ) -> Result<&mut Self, LoadError> {
        let name = name.into();
        if self.models.contains_key(&name) {
            return Err(LoadError::Duplicate(name));
        }
        self.models.insert(name, predictor);
        Ok(self)
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            models: self.models,
        }
    }
}

fn load_artifact(source: &ModelSource) -> Result<(PredictorHandle, LoadedModel), LoadError> {
    let name = source.name.as_str();
    let path = source.path.as_path();

    if !path.is_file() {
        return Err(LoadError::Missing {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }

    let format = ArtifactFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
        name: name.to_string(),
        path: path.to_path_buf(),
    })?;

    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;

    let sha256 = hex::encode(Sha256::digest(&bytes));
    if let Some(expected) = &source.expected_sha256 {
        if !expected.eq_ignore_ascii_case(&sha256) {
            return Err(LoadError::ChecksumMismatch {
                name: name.to_string(),
                expected: expected.clone(),
                actual: sha256,
            });
        }
    }

    let invalid = |reason: String| LoadError::InvalidModel {
        name: name.to_string(),
        reason,
    };

    let predictor: PredictorHandle = match format {
        ArtifactFormat::Onnx => Arc::new(
            OnnxPredictor::from_bytes(&bytes).map_err(|e| invalid(format!("{e:#}")))?,
        ) as PredictorHandle,
        ArtifactFormat::LinearJson => {
            Arc::new(LinearPredictor::from_json(&bytes).map_err(invalid)?) as PredictorHandle
        }
    };

    debug!(model = %name, kind = predictor.kind(), path = ?path, "Artifact deserialized");

    let loaded = LoadedModel {
        name: name.to_string(),
        kind: predictor.kind(),
        path: path.to_path_buf(),
        sha256,
    };
    Ok((predictor, loaded))
}
