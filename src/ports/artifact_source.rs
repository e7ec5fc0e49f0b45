//! Artifact source port: Trait for obtaining the classifier of a horizon.
//!
//! This trait abstracts artifact storage (files on disk) from the
//! prediction gateway, so tests can supply in-memory classifiers.

use std::sync::Arc;

use super::classifier::{Classifier, InferenceError};
use crate::domain::Horizon;

/// Given a horizon, return a ready classifier.
pub trait ArtifactSource: Send + Sync {
    /// Load (deserialize) the classifier for `horizon`.
    ///
    /// Called at most once per horizon while the gateway cache is enabled.
    ///
    /// # Errors
    /// Returns `InferenceError::ArtifactUnavailable` if the artifact cannot be
    /// read or decoded, or `InferenceError::SchemaMismatch` if it was built
    /// for another horizon.
    fn load(&self, horizon: Horizon) -> Result<Arc<dyn Classifier>, InferenceError>;

    /// Human-readable location of the artifact, for logs.
    fn describe(&self, horizon: Horizon) -> String;
}
