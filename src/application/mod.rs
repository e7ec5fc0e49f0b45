//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod assessment;
pub(crate) mod predictor;

pub use assessment::{Assessment, AssessmentService, Rejection};
pub use predictor::PredictorGateway;
