//! Classifier port: Trait for a loaded, pre-trained binary classifier.
//!
//! The application never sees the artifact format; it only calls this trait.

use crate::domain::Horizon;

/// Errors that can occur while obtaining or running a classifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    /// Artifact missing, unreadable, oversized, corrupt or not bound by the manifest.
    #[error("{horizon} model artifact unavailable: {reason}")]
    ArtifactUnavailable { horizon: Horizon, reason: String },

    /// The encoded record does not match what the artifact was trained on.
    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl InferenceError {
    pub fn unavailable(horizon: Horizon, reason: impl Into<String>) -> Self {
        Self::ArtifactUnavailable {
            horizon,
            reason: reason.into(),
        }
    }
}

/// Trait for a pre-fitted binary classifier.
///
/// Implementations are immutable after loading and must be deterministic:
/// the same input always yields the same output.
pub trait Classifier: Send + Sync {
    /// Column names the classifier was fitted on, in positional order.
    fn feature_names(&self) -> &[String];

    /// Probability vector `[P(class 0), P(class 1)]` for one row.
    ///
    /// # Errors
    /// Returns `InferenceError::SchemaMismatch` if `features` has the wrong length.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], InferenceError>;

    /// Hard class label for one row.
    ///
    /// # Errors
    /// Returns `InferenceError::SchemaMismatch` if `features` has the wrong length.
    fn predict(&self, features: &[f64]) -> Result<u8, InferenceError> {
        let proba = self.predict_proba(features)?;
        Ok(u8::from(proba[1] > proba[0]))
    }
}
