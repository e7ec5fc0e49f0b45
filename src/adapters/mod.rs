//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifact`: filesystem artifact store, model formats and integrity manifest

pub mod artifact;

pub use artifact::ManifestError;
