//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (model artifacts on disk).

mod artifact_source;
mod classifier;

pub use artifact_source::ArtifactSource;
pub use classifier::{Classifier, InferenceError};
