//! Runtime configuration read from `MYOPIA_*` environment variables.
//!
//! Only the binaries read the environment; the library core receives the
//! resulting values through constructors.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{Horizon, OutputMode};
use crate::MyopiaError;

pub const DEFAULT_MODEL_DIR: &str = "model";
pub const DEFAULT_MODEL_1Y: &str = "myopia_1y.json";
pub const DEFAULT_MODEL_3Y: &str = "myopia_3y.json";
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 64 * 1024 * 1024;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding both artifacts (and the optional manifest).
    pub model_dir: PathBuf,
    /// Artifact file name for the 1-year horizon.
    pub model_1y: String,
    /// Artifact file name for the 3-year horizon.
    pub model_3y: String,
    pub output_mode: OutputMode,
    /// Keep loaded artifacts for the life of the process.
    pub cache_models: bool,
    pub load_timeout: Duration,
    pub max_artifact_bytes: u64,
    /// Refuse artifacts not bound by `manifest.json`.
    pub require_manifest: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            model_1y: DEFAULT_MODEL_1Y.to_string(),
            model_3y: DEFAULT_MODEL_3Y.to_string(),
            output_mode: OutputMode::Probability,
            cache_models: true,
            load_timeout: Duration::from_millis(DEFAULT_LOAD_TIMEOUT_MS),
            max_artifact_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
            require_manifest: false,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `MyopiaError::Config` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, MyopiaError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `MyopiaError::Config` if a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MyopiaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("MYOPIA_MODEL_DIR") {
            config.model_dir = PathBuf::from(dir);
        }
        if let Some(name) = get("MYOPIA_MODEL_1Y") {
            config.model_1y = name;
        }
        if let Some(name) = get("MYOPIA_MODEL_3Y") {
            config.model_3y = name;
        }
        if let Some(mode) = get("MYOPIA_OUTPUT_MODE") {
            config.output_mode = mode
                .parse()
                .map_err(|e| MyopiaError::Config(format!("MYOPIA_OUTPUT_MODE: {e}")))?;
        }
        if let Some(v) = get("MYOPIA_CACHE_MODELS") {
            config.cache_models = parse_bool("MYOPIA_CACHE_MODELS", &v)?;
        }
        if let Some(v) = get("MYOPIA_MODEL_LOAD_TIMEOUT_MS") {
            let ms = parse_positive("MYOPIA_MODEL_LOAD_TIMEOUT_MS", &v)?;
            config.load_timeout = Duration::from_millis(ms);
        }
        if let Some(v) = get("MYOPIA_MODEL_MAX_BYTES") {
            config.max_artifact_bytes = parse_positive("MYOPIA_MODEL_MAX_BYTES", &v)?;
        }
        if let Some(v) = get("MYOPIA_REQUIRE_MANIFEST") {
            config.require_manifest = parse_bool("MYOPIA_REQUIRE_MANIFEST", &v)?;
        }

        Ok(config)
    }

    /// Artifact file name configured for `horizon`.
    #[must_use]
    pub fn model_file(&self, horizon: Horizon) -> &str {
        match horizon {
            Horizon::OneYear => &self.model_1y,
            Horizon::ThreeYears => &self.model_3y,
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, MyopiaError> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Ok(false),
        other => Err(MyopiaError::Config(format!(
            "{name}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_positive(name: &str, value: &str) -> Result<u64, MyopiaError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| MyopiaError::Config(format!("{name}: expected a positive integer, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = Config::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, Config::default());
        assert_eq!(config.model_file(Horizon::OneYear), "myopia_1y.json");
        assert_eq!(config.model_file(Horizon::ThreeYears), "myopia_3y.json");
        assert!(config.cache_models);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("MYOPIA_MODEL_DIR", "/srv/models"),
            ("MYOPIA_MODEL_3Y", "three.bin"),
            ("MYOPIA_OUTPUT_MODE", "label"),
            ("MYOPIA_CACHE_MODELS", "no"),
            ("MYOPIA_MODEL_LOAD_TIMEOUT_MS", "250"),
            ("MYOPIA_REQUIRE_MANIFEST", "1"),
        ]))
        .expect("valid");

        assert_eq!(config.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.model_file(Horizon::ThreeYears), "three.bin");
        assert_eq!(config.output_mode, OutputMode::Label);
        assert!(!config.cache_models);
        assert_eq!(config.load_timeout, Duration::from_millis(250));
        assert!(config.require_manifest);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("MYOPIA_MODEL_DIR", "  ")])).expect("valid");
        assert_eq!(config.model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for (key, value) in [
            ("MYOPIA_OUTPUT_MODE", "score"),
            ("MYOPIA_CACHE_MODELS", "maybe"),
            ("MYOPIA_MODEL_LOAD_TIMEOUT_MS", "0"),
            ("MYOPIA_MODEL_MAX_BYTES", "-5"),
        ] {
            let err = Config::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(matches!(err, MyopiaError::Config(_)), "{key}");
            assert!(err.to_string().contains(key));
        }
    }
}
