//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - Questionnaire form with sample answers
//! - Background prediction with progress
//! - Result view with the encoded input row and the prediction

mod app;
mod styles;
mod ui;
mod worker;

pub use app::App;
pub use styles::MedicalTheme;
pub use worker::{AssessmentProgress, AssessmentWorker, AssessmentWorkerHandle};
