//! Domain layer: Core questionnaire types and encoding.
//!
//! This module contains pure Rust types with no I/O.
//! The encoder is the only way to obtain a `FeatureRecord`.

mod encoder;
mod features;
mod prediction;
pub mod questionnaire;
mod submission;

pub use encoder::{encode, ValidationError};
pub use features::{model_feature_names, FeatureRecord, Horizon, MODEL_FEATURE_COUNT};
pub use prediction::{Outcome, OutputMode, PredictionResult, RiskLevel};
pub use questionnaire::{field_specs, Choice, Field, FieldKind, FieldSpec, NumericRange};
pub use submission::{InputError, Submission};
