//! Versioned model artifacts and their persistence boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::classifier::LogisticClassifier;
use crate::models::evaluation::EvaluationMetrics;
use crate::models::scaler::StandardScaler;

/// A trained model plus everything needed to reproduce its predictions:
/// the fitted scaler and classifier state, the ordered feature-name list,
/// and the held-out evaluation metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub classifier: LogisticClassifier,
    pub metrics: EvaluationMetrics,
    pub trained_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Storage boundary for model artifacts.
///
/// `activate` is the single atomic transition: once it returns, exactly the
/// named version is active and every other artifact is not. Readers never
/// observe zero or multiple active models across the transition.
pub trait ModelRegistry: Send + Sync {
    /// Persist a new artifact. Saved artifacts start inactive.
    fn save(&self, artifact: ModelArtifact) -> Result<()>;

    /// Make `version` the single active artifact.
    fn activate(&self, version: &str) -> Result<()>;

    /// The currently active artifact, if any.
    fn active(&self) -> Result<Option<ModelArtifact>>;

    fn get(&self, version: &str) -> Result<Option<ModelArtifact>>;

    fn versions(&self) -> Result<Vec<String>>;
}

/// In-memory registry; one lock guards the whole state, so activation is a
/// single closed write.
pub struct InMemoryModelRegistry {
    inner: RwLock<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    artifacts: HashMap<String, ModelArtifact>,
    active: Option<String>,
}

impl InMemoryModelRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryState::default()),
        }
    }
}

impl Default for InMemoryModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry for InMemoryModelRegistry {
    fn save(&self, mut artifact: ModelArtifact) -> Result<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| Error::Store("model registry lock poisoned".into()))?;
        artifact.is_active = false;
        state.artifacts.insert(artifact.version.clone(), artifact);
        Ok(())
    }

    fn activate(&self, version: &str) -> Result<()> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| Error::Store("model registry lock poisoned".into()))?;
        if !state.artifacts.contains_key(version) {
            return Err(Error::ModelNotFound(version.to_string()));
        }
        for (key, artifact) in state.artifacts.iter_mut() {
            artifact.is_active = key == version;
        }
        state.active = Some(version.to_string());
        Ok(())
    }

    fn active(&self) -> Result<Option<ModelArtifact>> {
        let state = self
            .inner
            .read()
            .map_err(|_| Error::Store("model registry lock poisoned".into()))?;
        Ok(state
            .active
            .as_ref()
            .and_then(|version| state.artifacts.get(version))
            .cloned())
    }

    fn get(&self, version: &str) -> Result<Option<ModelArtifact>> {
        let state = self
            .inner
            .read()
            .map_err(|_| Error::Store("model registry lock poisoned".into()))?;
        Ok(state.artifacts.get(version).cloned())
    }

    fn versions(&self) -> Result<Vec<String>> {
        let state = self
            .inner
            .read()
            .map_err(|_| Error::Store("model registry lock poisoned".into()))?;
        let mut versions: Vec<String> = state.artifacts.keys().cloned().collect();
        versions.sort();
        Ok(versions)
    }
}

/// File-backed registry: one JSON document per version in `dir`, plus an
/// `ACTIVE` pointer file. Rewriting the pointer is the whole activation
/// transition, so there is never a state with two active versions.
pub struct FileModelRegistry {
    dir: PathBuf,
}

const ACTIVE_POINTER: &str = "ACTIVE";

impl FileModelRegistry {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn artifact_path(&self, version: &str) -> PathBuf {
        self.dir.join(format!("{version}.json"))
    }

    fn active_version(&self) -> Result<Option<String>> {
        let pointer = self.dir.join(ACTIVE_POINTER);
        if !pointer.exists() {
            return Ok(None);
        }
        let version = fs::read_to_string(pointer)?.trim().to_string();
        if version.is_empty() {
            Ok(None)
        } else {
            Ok(Some(version))
        }
    }

    fn load(&self, version: &str) -> Result<Option<ModelArtifact>> {
        let path = self.artifact_path(version);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        Ok(Some(artifact))
    }
}

impl ModelRegistry for FileModelRegistry {
    fn save(&self, mut artifact: ModelArtifact) -> Result<()> {
        artifact.is_active = false;
        let bytes = serde_json::to_vec_pretty(&artifact)?;
        fs::write(self.artifact_path(&artifact.version), bytes)?;
        Ok(())
    }

    fn activate(&self, version: &str) -> Result<()> {
        if !self.artifact_path(version).exists() {
            return Err(Error::ModelNotFound(version.to_string()));
        }
        fs::write(self.dir.join(ACTIVE_POINTER), version)?;
        Ok(())
    }

    fn active(&self) -> Result<Option<ModelArtifact>> {
        match self.active_version()? {
            Some(version) => {
                let mut artifact = self
                    .load(&version)?
                    .ok_or_else(|| Error::ModelNotFound(version))?;
                artifact.is_active = true;
                Ok(Some(artifact))
            }
            None => Ok(None),
        }
    }

    fn get(&self, version: &str) -> Result<Option<ModelArtifact>> {
        let active = self.active_version()?;
        Ok(self.load(version)?.map(|mut artifact| {
            artifact.is_active = active.as_deref() == Some(version);
            artifact
        }))
    }

    fn versions(&self) -> Result<Vec<String>> {
        let mut versions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    versions.push(stem.to_string());
                }
            }
        }
        versions.sort();
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::{FEATURE_COUNT, FEATURE_NAMES};

    fn artifact(version: &str) -> ModelArtifact {
        ModelArtifact {
            version: version.to_string(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler: StandardScaler::identity(),
            classifier: LogisticClassifier::untrained(FEATURE_COUNT),
            metrics: EvaluationMetrics {
                accuracy: 0.9,
                precision: 0.8,
                recall: 0.7,
                f1: 0.75,
                auc: 0.95,
            },
            trained_at: Utc::now(),
            is_active: false,
        }
    }

    #[test]
    fn test_in_memory_activation_is_exclusive() {
        let registry = InMemoryModelRegistry::new();
        registry.save(artifact("v1.a")).unwrap();
        registry.save(artifact("v1.b")).unwrap();

        registry.activate("v1.a").unwrap();
        registry.activate("v1.b").unwrap();

        let active = registry.active().unwrap().unwrap();
        assert_eq!(active.version, "v1.b");
        assert!(active.is_active);
        assert!(!registry.get("v1.a").unwrap().unwrap().is_active);
    }

    #[test]
    fn test_in_memory_activate_unknown_version() {
        let registry = InMemoryModelRegistry::new();
        let err = registry.activate("v1.missing").unwrap_err();
        assert!(matches!(err, Error::ModelNotFound(_)));
        assert!(registry.active().unwrap().is_none());
    }

    #[test]
    fn test_file_registry_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileModelRegistry::new(dir.path()).unwrap();

        registry.save(artifact("v1.202506010000")).unwrap();
        registry.activate("v1.202506010000").unwrap();

        let reloaded = registry.active().unwrap().unwrap();
        assert_eq!(reloaded.version, "v1.202506010000");
        assert!(reloaded.is_active);
        assert_eq!(
            reloaded.feature_names,
            FEATURE_NAMES.iter().map(|s| s.to_string()).collect::<Vec<_>>()
        );
        assert_eq!(reloaded.metrics.accuracy, 0.9);
    }

    #[test]
    fn test_file_registry_activation_switches() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileModelRegistry::new(dir.path()).unwrap();

        registry.save(artifact("v1.one")).unwrap();
        registry.save(artifact("v1.two")).unwrap();
        registry.activate("v1.one").unwrap();
        registry.activate("v1.two").unwrap();

        assert_eq!(registry.active().unwrap().unwrap().version, "v1.two");
        assert!(!registry.get("v1.one").unwrap().unwrap().is_active);
        assert_eq!(registry.versions().unwrap(), vec!["v1.one", "v1.two"]);
    }

    #[test]
    fn test_file_registry_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileModelRegistry::new(dir.path()).unwrap();
        assert!(registry.active().unwrap().is_none());
        assert!(registry.versions().unwrap().is_empty());
        assert!(registry.get("v1.none").unwrap().is_none());
    }
}
