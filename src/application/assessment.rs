//! Assessment service: Validate, encode and predict in one request.
//!
//! This is the surface the presentation layer talks to:
//! - `validate_and_encode`: answers → feature record
//! - `run_prediction`: feature record → prediction
//! - `assess`: both, wrapped in a displayable [`Assessment`]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::predictor::PredictorGateway;
use crate::domain::{
    encode, FeatureRecord, Field, Horizon, OutputMode, PredictionResult, RiskLevel, Submission,
    ValidationError,
};
use crate::ports::{ArtifactSource, Classifier, InferenceError};
use crate::MyopiaError;

/// Outcome of one submission, ready for display or JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    /// Encoded input row, in declared column order.
    pub record: FeatureRecord,
    pub prediction: PredictionResult,
    pub risk_level: RiskLevel,
    pub assessed_at: DateTime<Utc>,
}

impl Assessment {
    #[must_use]
    pub fn new(record: FeatureRecord, prediction: PredictionResult) -> Self {
        Self {
            record,
            risk_level: prediction.risk_level(),
            prediction,
            assessed_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn horizon(&self) -> Horizon {
        self.prediction.horizon
    }

    /// The input row as `name = value` lines.
    #[must_use]
    pub fn input_row(&self) -> Vec<(&'static str, String)> {
        self.record
            .iter()
            .map(|(field, value)| {
                let text = match field {
                    Field::Bmi => format!("{value:.1}"),
                    _ => format!("{value}"),
                };
                (field.name(), text)
            })
            .collect()
    }
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Input row:")?;
        for (name, value) in self.input_row() {
            writeln!(f, "  {name:<36} {value}")?;
        }
        writeln!(f, "{}", self.prediction)?;
        write!(f, "{}", self.risk_level.description())
    }
}

/// JSON body describing a rejected submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub error: String,
    pub missing: Vec<&'static str>,
    pub invalid: Vec<&'static str>,
}

impl From<&ValidationError> for Rejection {
    fn from(e: &ValidationError) -> Self {
        Self {
            error: e.to_string(),
            missing: e.missing.iter().map(|f| f.name()).collect(),
            invalid: e.invalid.iter().map(|(f, _)| f.name()).collect(),
        }
    }
}

/// Service turning questionnaire answers into myopia predictions.
pub struct AssessmentService<S>
where
    S: ArtifactSource,
{
    gateway: PredictorGateway<S>,
    mode: OutputMode,
}

impl<S> AssessmentService<S>
where
    S: ArtifactSource,
{
    /// Create a new assessment service.
    pub fn new(gateway: PredictorGateway<S>, mode: OutputMode) -> Self {
        Self { gateway, mode }
    }

    /// Shorthand for a caching gateway over `source`.
    pub fn with_source(source: Arc<S>, mode: OutputMode) -> Self {
        Self::new(PredictorGateway::new(source), mode)
    }

    #[must_use]
    pub fn output_mode(&self) -> OutputMode {
        self.mode
    }

    #[must_use]
    pub fn gateway(&self) -> &PredictorGateway<S> {
        &self.gateway
    }

    /// Validate answers and encode them.
    ///
    /// # Errors
    /// Returns `ValidationError` if any item is unanswered or unrecognized.
    pub fn validate_and_encode(
        &self,
        submission: &Submission,
    ) -> Result<FeatureRecord, ValidationError> {
        encode(submission)
    }

    /// Run the classifier for the record's horizon.
    ///
    /// # Errors
    /// Returns `InferenceError` if the artifact cannot be used.
    pub fn run_prediction(&self, record: &FeatureRecord) -> Result<PredictionResult, InferenceError> {
        self.gateway
            .predict(record, self.mode)
            .inspect_err(log_inference_error)
    }

    /// Obtain the classifier for `horizon` (cached or freshly loaded).
    ///
    /// # Errors
    /// Returns `InferenceError` if the artifact cannot be loaded.
    pub fn load_classifier(&self, horizon: Horizon) -> Result<Arc<dyn Classifier>, InferenceError> {
        self.gateway
            .classifier(horizon)
            .inspect_err(log_inference_error)
    }

    /// Run a classifier obtained from [`Self::load_classifier`] on `record`.
    ///
    /// # Errors
    /// Returns `InferenceError::SchemaMismatch` if the columns disagree.
    pub fn run_prediction_with(
        &self,
        classifier: &dyn Classifier,
        record: &FeatureRecord,
    ) -> Result<PredictionResult, InferenceError> {
        self.gateway
            .predict_with(classifier, record, self.mode)
            .inspect_err(log_inference_error)
    }

    /// Full request: validate, encode, predict.
    ///
    /// # Errors
    /// Returns `MyopiaError::Validation` or `MyopiaError::Inference`.
    pub fn assess(&self, submission: &Submission) -> Result<Assessment, MyopiaError> {
        let record = self.validate_and_encode(submission)?;
        let prediction = self.run_prediction(&record)?;
        tracing::info!("Assessment complete ({} horizon)", prediction.horizon);
        Ok(Assessment::new(record, prediction))
    }
}

fn log_inference_error(e: &InferenceError) {
    match e {
        InferenceError::SchemaMismatch(detail) => {
            tracing::error!("Internal error: encoder and model disagree: {detail}");
        }
        InferenceError::ArtifactUnavailable { .. } => tracing::error!("{e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::predictor::tests::CountingSource;
    use crate::domain::Outcome;

    fn service(mode: OutputMode) -> AssessmentService<CountingSource> {
        AssessmentService::with_source(Arc::new(CountingSource::new(0.25, 0.75)), mode)
    }

    #[test]
    fn test_example_routes_to_one_year_model() {
        let service = service(OutputMode::Probability);
        let assessment = service.assess(&Submission::example()).expect("assess");

        assert_eq!(assessment.horizon(), Horizon::OneYear);
        assert_eq!(assessment.prediction.outcome, Outcome::Probability(0.25));
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(service.gateway().source().loads(Horizon::OneYear), 1);
        assert_eq!(service.gateway().source().loads(Horizon::ThreeYears), 0);
    }

    #[test]
    fn test_validation_failure_performs_no_load() {
        let service = service(OutputMode::Probability);
        let mut submission = Submission::example();
        submission.clear(Field::Resident);

        let err = service.assess(&submission).unwrap_err();
        match err {
            MyopiaError::Validation(e) => assert_eq!(e.missing, vec![Field::Resident]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.gateway().source().loads(Horizon::OneYear), 0);
        assert_eq!(service.gateway().source().loads(Horizon::ThreeYears), 0);
    }

    #[test]
    fn test_inference_failure_is_reported() {
        let mut source = CountingSource::new(0.25, 0.75);
        source.fail = true;
        let service = AssessmentService::with_source(Arc::new(source), OutputMode::Label);
        let err = service.assess(&Submission::example()).unwrap_err();
        assert!(matches!(err, MyopiaError::Inference(_)));
    }

    #[test]
    fn test_rejection_exit_code_and_report() {
        let service = service(OutputMode::Probability);
        let mut submission = Submission::example();
        submission.clear(Field::Sex);
        submission.set_label(Field::FrequencyOfSugarySnack, "Hourly");

        let err = service.assess(&submission).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let MyopiaError::Validation(e) = &err else {
            panic!("unexpected error: {err}");
        };
        let json = serde_json::to_value(Rejection::from(e)).expect("json");
        assert_eq!(json["error"], "all required fields must be filled");
        assert_eq!(json["missing"], serde_json::json!(["Sex"]));
        assert_eq!(json["invalid"], serde_json::json!(["Frequency_of_sugary_snack"]));
    }

    #[test]
    fn test_inference_failure_exit_code() {
        let mut source = CountingSource::new(0.25, 0.75);
        source.fail = true;
        let service = AssessmentService::with_source(Arc::new(source), OutputMode::Probability);
        let err = service.assess(&Submission::example()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(MyopiaError::Config("bad".into()).exit_code(), 1);
    }

    #[test]
    fn test_input_row_and_display() {
        let assessment = service(OutputMode::Label)
            .assess(&Submission::example())
            .expect("assess");
        let row = assessment.input_row();
        assert_eq!(row.len(), Field::COUNT);
        assert_eq!(row[0], ("Year", "1".to_string()));
        assert_eq!(row[4], ("BMI", "19.5".to_string()));

        let text = assessment.to_string();
        assert!(text.contains("1-year predicted outcome: 0 (no myopia)"), "{text}");
    }

    #[test]
    fn test_assessment_serializes_to_json() {
        let assessment = service(OutputMode::Probability)
            .assess(&Submission::example())
            .expect("assess");
        let json = serde_json::to_value(&assessment).expect("json");
        assert_eq!(json["record"]["Year"], 1);
        assert_eq!(json["record"]["BMI"], 19.5);
        assert_eq!(json["prediction"]["horizon"], 1);
        assert_eq!(json["prediction"]["outcome"]["probability"], 0.25);
        assert_eq!(json["risk_level"], "Low");
    }
}
