//! # Myopia Risk
//!
//! Questionnaire-driven myopia risk estimation.
//!
//! This crate provides:
//! - A fixed 15-item questionnaire and its label-to-code mapping
//! - All-or-nothing validation and encoding into a fixed-order feature record
//! - Routing of each record to a pre-trained 1-year or 3-year classifier
//! - Terminal UI for local-only use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (questionnaire, submission, encoder, predictions)
//! - `ports`: Trait definitions for classifiers and artifact sources
//! - `adapters`: Concrete implementations (filesystem artifact store)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::{Assessment, AssessmentService};
pub use config::Config;
pub use domain::{FeatureRecord, Horizon, PredictionResult, RiskLevel, Submission};

/// Result type for myopia-risk operations
pub type Result<T> = std::result::Result<T, MyopiaError>;

/// Main error type for myopia-risk
#[derive(Debug, thiserror::Error)]
pub enum MyopiaError {
    #[error("Invalid submission: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Unreadable answer: {0}")]
    Input(#[from] domain::InputError),

    #[error("Prediction failed: {0}")]
    Inference(#[from] ports::InferenceError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] adapters::ManifestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MyopiaError {
    /// Process exit status for a failed request: 2 when the answers were
    /// rejected, 1 for everything else.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Input(_) => 2,
            _ => 1,
        }
    }
}
