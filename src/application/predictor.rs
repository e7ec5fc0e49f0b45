//! Predictor gateway: Routes a feature record to the classifier for its horizon.
//!
//! Each horizon has its own cache slot. The slot lock is held across the
//! load, so concurrent first requests for one horizon perform a single load
//! while requests for the other horizon proceed independently.

use std::sync::{Arc, Mutex};

use crate::domain::{model_feature_names, FeatureRecord, Horizon, OutputMode, PredictionResult};
use crate::ports::{ArtifactSource, Classifier, InferenceError};

type Slot = Mutex<Option<Arc<dyn Classifier>>>;

/// Gateway owning the per-horizon classifier cache.
pub struct PredictorGateway<S>
where
    S: ArtifactSource,
{
    source: Arc<S>,
    /// Indexed by `Horizon::index()`.
    slots: [Slot; 2],
    cache: bool,
}

impl<S> PredictorGateway<S>
where
    S: ArtifactSource,
{
    /// Create a gateway that keeps loaded classifiers for its lifetime.
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            slots: [Mutex::new(None), Mutex::new(None)],
            cache: true,
        }
    }

    /// Enable or disable caching. Without caching every request reloads.
    #[must_use]
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Artifact source backing this gateway.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether the classifier for `horizon` is already resident.
    #[must_use]
    pub fn is_loaded(&self, horizon: Horizon) -> bool {
        self.slots[horizon.index()]
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Run the classifier selected by the record's horizon.
    ///
    /// # Errors
    /// - `ArtifactUnavailable` if the artifact cannot be loaded
    /// - `SchemaMismatch` if the artifact was fitted on different columns
    pub fn predict(
        &self,
        record: &FeatureRecord,
        mode: OutputMode,
    ) -> Result<PredictionResult, InferenceError> {
        let classifier = self.classifier(record.horizon())?;
        self.predict_with(classifier.as_ref(), record, mode)
    }

    /// Run an already obtained classifier on `record`.
    ///
    /// The caller must have fetched `classifier` for `record.horizon()`.
    ///
    /// # Errors
    /// Returns `SchemaMismatch` if the classifier was fitted on different columns.
    pub fn predict_with(
        &self,
        classifier: &dyn Classifier,
        record: &FeatureRecord,
        mode: OutputMode,
    ) -> Result<PredictionResult, InferenceError> {
        let horizon = record.horizon();
        check_schema(classifier)?;

        let input = record.model_input();
        let result = match mode {
            OutputMode::Probability => {
                let proba = classifier.predict_proba(&input)?;
                PredictionResult::probability(horizon, proba[1])
            }
            OutputMode::Label => PredictionResult::label(horizon, classifier.predict(&input)?),
        };

        tracing::debug!("{horizon} prediction complete");
        Ok(result)
    }

    /// Get the classifier for `horizon`, loading it on first use.
    ///
    /// # Errors
    /// Returns the source's load error. Failures are not cached.
    pub fn classifier(&self, horizon: Horizon) -> Result<Arc<dyn Classifier>, InferenceError> {
        if !self.cache {
            return self.source.load(horizon);
        }

        let mut slot = self.slots[horizon.index()]
            .lock()
            .map_err(|_| InferenceError::unavailable(horizon, "model cache lock poisoned"))?;

        if let Some(classifier) = slot.as_ref() {
            return Ok(Arc::clone(classifier));
        }

        tracing::info!("Loading {horizon} model from {}", self.source.describe(horizon));
        let classifier = self.source.load(horizon)?;
        *slot = Some(Arc::clone(&classifier));
        Ok(classifier)
    }
}

fn check_schema(classifier: &dyn Classifier) -> Result<(), InferenceError> {
    let expected = model_feature_names();
    let actual = classifier.feature_names();
    if actual.len() != expected.len() || actual.iter().zip(expected).any(|(a, e)| a != e) {
        return Err(InferenceError::SchemaMismatch(format!(
            "artifact expects [{}], encoder produces [{}]",
            actual.join(", "),
            expected.join(", ")
        )));
    }
    Ok(())
}
