//! Filesystem artifact store: Implementation of `ArtifactSource`.
//!
//! Loads the per-horizon classifier files from a model directory.
//!
//! # Integrity
//!
//! - If `manifest.json` is present, the artifact must be listed and its
//!   SHA-256 must match (see [`manifest`]).
//! - With `require_manifest`, an artifact without a manifest is refused.
//!
//! # Bounded loading
//!
//! Reads run on a helper thread and are abandoned after `load_timeout`.
//! Files larger than `max_bytes` are refused before reading. Both limits
//! signal a deployment/configuration problem, not a transient fault, so the
//! request fails and nothing is retried.

pub mod manifest;
pub mod model;

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, DEFAULT_LOAD_TIMEOUT_MS, DEFAULT_MAX_ARTIFACT_BYTES};
use crate::domain::Horizon;
use crate::ports::{ArtifactSource, Classifier, InferenceError};

pub use manifest::{ManifestError, ModelManifest, MANIFEST_FILE};
pub use model::{Artifact, ArtifactEncoding, ArtifactModel, FORMAT_VERSION};

/// Artifact store backed by a model directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
    /// File names indexed by `Horizon::index()`.
    files: [String; 2],
    load_timeout: Duration,
    max_bytes: u64,
    require_manifest: bool,
}

impl FsArtifactStore {
    /// Create a store over `dir` with default file names and limits.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: [
                crate::config::DEFAULT_MODEL_1Y.to_string(),
                crate::config::DEFAULT_MODEL_3Y.to_string(),
            ],
            load_timeout: Duration::from_millis(DEFAULT_LOAD_TIMEOUT_MS),
            max_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
            require_manifest: false,
        }
    }

    /// Create a store from runtime configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.model_dir.clone())
            .with_file(Horizon::OneYear, config.model_file(Horizon::OneYear))
            .with_file(Horizon::ThreeYears, config.model_file(Horizon::ThreeYears))
            .with_load_timeout(config.load_timeout)
            .with_max_bytes(config.max_artifact_bytes)
            .with_required_manifest(config.require_manifest)
    }

    #[must_use]
    pub fn with_file(mut self, horizon: Horizon, file_name: impl Into<String>) -> Self {
        self.files[horizon.index()] = file_name.into();
        self
    }

    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use]
    pub fn with_required_manifest(mut self, required: bool) -> Self {
        self.require_manifest = required;
        self
    }

    /// Model directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the artifact for `horizon`.
    #[must_use]
    pub fn path_for(&self, horizon: Horizon) -> PathBuf {
        self.dir.join(&self.files[horizon.index()])
    }

    fn read_bounded(&self, horizon: Horizon, path: &Path) -> Result<Vec<u8>, InferenceError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| InferenceError::unavailable(horizon, format!("{}: {e}", path.display())))?;
        if !metadata.is_file() {
            return Err(InferenceError::unavailable(
                horizon,
                format!("{} is not a file", path.display()),
            ));
        }
        if metadata.len() > self.max_bytes {
            return Err(too_large(horizon, path, self.max_bytes));
        }

        // The file may grow between the metadata call and the read.
        let owned = path.to_path_buf();
        let max_bytes = self.max_bytes;
        let bytes = read_with_timeout(horizon, path, self.load_timeout, move || {
            read_capped(&owned, max_bytes)
        })?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(too_large(horizon, path, self.max_bytes));
        }
        Ok(bytes)
    }

    fn verify_manifest(
        &self,
        horizon: Horizon,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), InferenceError> {
        let manifest = ModelManifest::read(&self.dir)
            .map_err(|e| InferenceError::unavailable(horizon, e.to_string()))?;
        match manifest {
            Some(manifest) => {
                manifest
                    .verify(file_name, bytes)
                    .map_err(|e| InferenceError::unavailable(horizon, e.to_string()))?;
                tracing::debug!("{file_name} matches manifest digest");
                Ok(())
            }
            None if self.require_manifest => Err(InferenceError::unavailable(
                horizon,
                format!("{MANIFEST_FILE} is required but missing from {}", self.dir.display()),
            )),
            None => {
                tracing::warn!(
                    "No {MANIFEST_FILE} in {:?}; loading {file_name} without integrity check",
                    self.dir
                );
                Ok(())
            }
        }
    }
}

impl ArtifactSource for FsArtifactStore {
    fn load(&self, horizon: Horizon) -> Result<Arc<dyn Classifier>, InferenceError> {
        let path = self.path_for(horizon);
        let file_name = &self.files[horizon.index()];
        tracing::debug!("Loading {horizon} artifact from {:?}", path);

        let encoding = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ArtifactEncoding::from_extension)
            .ok_or_else(|| {
                InferenceError::unavailable(
                    horizon,
                    format!("unsupported artifact extension: {}", path.display()),
                )
            })?;

        let bytes = self.read_bounded(horizon, &path)?;
        self.verify_manifest(horizon, file_name, &bytes)?;

        let artifact = Artifact::decode(&bytes, encoding)
            .map_err(|e| InferenceError::unavailable(horizon, e))?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(InferenceError::unavailable(
                horizon,
                format!(
                    "unsupported artifact format version {} (expected {FORMAT_VERSION})",
                    artifact.format_version
                ),
            ));
        }
        if let Some(declared) = artifact.horizon {
            if declared != horizon {
                return Err(InferenceError::SchemaMismatch(format!(
                    "{} was trained for the {declared} horizon but is configured for {horizon}",
                    path.display()
                )));
            }
        }
        artifact
            .model
            .validate()
            .map_err(|e| InferenceError::unavailable(horizon, format!("corrupt artifact: {e}")))?;

        tracing::info!(
            "Loaded {horizon} model ({}, {} features, {} bytes)",
            artifact.model.kind(),
            artifact.model.feature_names().len(),
            bytes.len()
        );

        Ok(Arc::new(artifact.model))
    }

    fn describe(&self, horizon: Horizon) -> String {
        self.path_for(horizon).display().to_string()
    }
}

fn too_large(horizon: Horizon, path: &Path, max_bytes: u64) -> InferenceError {
    tracing::error!(
        "Artifact {:?} is above the configured limit of {} bytes (MYOPIA_MODEL_MAX_BYTES)",
        path,
        max_bytes
    );
    InferenceError::unavailable(
        horizon,
        format!("{} exceeds the {} byte artifact limit", path.display(), max_bytes),
    )
}

/// Read at most `max_bytes + 1` bytes, so an oversized file is detectable
/// without buffering all of it.
fn read_capped(path: &Path, max_bytes: u64) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    File::open(path)?
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Run `read` on a helper thread and wait at most `timeout` for it.
///
/// A read that overruns is abandoned; its thread finishes in the background.
fn read_with_timeout<F>(
    horizon: Horizon,
    path: &Path,
    timeout: Duration,
    read: F,
) -> Result<Vec<u8>, InferenceError>
where
    F: FnOnce() -> io::Result<Vec<u8>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name(format!("artifact-load-{}y", horizon.years()))
        .spawn(move || {
            let _ = tx.send(read());
        })
        .map_err(|e| InferenceError::unavailable(horizon, format!("cannot spawn loader: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(InferenceError::unavailable(
            horizon,
            format!("{}: {e}", path.display()),
        )),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::error!(
                "Reading {:?} did not finish within {:?}; check the model storage or MYOPIA_MODEL_LOAD_TIMEOUT_MS",
                path,
                timeout
            );
            Err(InferenceError::unavailable(
                horizon,
                format!("load timed out after {timeout:?}"),
            ))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(InferenceError::unavailable(
            horizon,
            "loader thread exited without a result",
        )),
    }
}
