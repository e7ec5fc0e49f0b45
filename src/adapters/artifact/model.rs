//! Serialized classifier formats.
//!
//! Artifacts are exported by the modelling pipeline as either JSON or bincode.
//! Two model families are supported:
//!
//! - `logistic`: standardized logistic regression
//! - `tree_ensemble`: gradient boosted trees (`sum_logit`) or a random forest
//!   (`mean_probability`)
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "horizon": 1,
//!   "model": {
//!     "logistic": {
//!       "feature_names": ["Grade", "Sex", "..."],
//!       "coefficients": [0.12, -0.4, ...],
//!       "intercept": -1.3,
//!       "scaler": { "mean": [...], "scale": [...] }
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::Horizon;
use crate::ports::{Classifier, InferenceError};

/// Current artifact envelope version.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk encoding of an artifact, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactEncoding {
    Json,
    Bincode,
}

impl ArtifactEncoding {
    /// Detect the encoding from a file extension (`json` or `bin`).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "bin" | "bincode" => Some(Self::Bincode),
            _ => None,
        }
    }
}

/// Artifact envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub format_version: u32,
    /// Horizon the model was trained for, if the exporter recorded it.
    pub horizon: Option<Horizon>,
    pub model: ArtifactModel,
}

impl Artifact {
    /// Decode an artifact from raw bytes.
    ///
    /// # Errors
    /// Returns a description of the decoding failure.
    pub fn decode(bytes: &[u8], encoding: ArtifactEncoding) -> Result<Self, String> {
        match encoding {
            ArtifactEncoding::Json => {
                serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON artifact: {e}"))
            }
            ArtifactEncoding::Bincode => {
                bincode::deserialize(bytes).map_err(|e| format!("invalid bincode artifact: {e}"))
            }
        }
    }

    /// Encode an artifact, as the exporter does.
    ///
    /// # Errors
    /// Returns a description of the encoding failure.
    pub fn encode(&self, encoding: ArtifactEncoding) -> Result<Vec<u8>, String> {
        match encoding {
            ArtifactEncoding::Json => serde_json::to_vec_pretty(self).map_err(|e| e.to_string()),
            ArtifactEncoding::Bincode => bincode::serialize(self).map_err(|e| e.to_string()),
        }
    }
}

/// A fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactModel {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

impl ArtifactModel {
    /// Short family name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Logistic(_) => "logistic",
            Self::TreeEnsemble(m) => match m.aggregation {
                Aggregation::SumLogit => "gradient_boosting",
                Aggregation::MeanProbability => "random_forest",
            },
        }
    }

    /// Structural sanity checks run once after loading.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency found.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Logistic(m) => m.validate(),
            Self::TreeEnsemble(m) => m.validate(),
        }
    }

    fn positive_probability(&self, x: &[f64]) -> f64 {
        match self {
            Self::Logistic(m) => m.positive_probability(x),
            Self::TreeEnsemble(m) => m.positive_probability(x),
        }
    }
}

impl Classifier for ArtifactModel {
    fn feature_names(&self) -> &[String] {
        match self {
            Self::Logistic(m) => &m.feature_names,
            Self::TreeEnsemble(m) => &m.feature_names,
        }
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], InferenceError> {
        let expected = self.feature_names().len();
        if features.len() != expected {
            return Err(InferenceError::SchemaMismatch(format!(
                "model expects {expected} features, got {}",
                features.len()
            )));
        }
        let p = self.positive_probability(features).clamp(0.0, 1.0);
        Ok([1.0 - p, p])
    }
}

/// Per-feature standardization applied before the linear term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Logistic regression: `sigmoid(intercept + Σ coef·z)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
}

impl LogisticModel {
    fn validate(&self) -> Result<(), String> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err("logistic model has no features".into());
        }
        if self.coefficients.len() != n {
            return Err(format!(
                "{} coefficients for {n} features",
                self.coefficients.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("non-finite coefficient".into());
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                return Err("scaler length does not match feature count".into());
            }
            if scaler
                .scale
                .iter()
                .any(|s| !s.is_finite() || s.abs() < f64::EPSILON)
            {
                return Err("scaler contains a zero or non-finite scale".into());
            }
            if scaler.mean.iter().any(|m| !m.is_finite()) {
                return Err("scaler contains a non-finite mean".into());
            }
        }
        Ok(())
    }

    fn positive_probability(&self, x: &[f64]) -> f64 {
        let mut z = self.intercept;
        for (i, (&value, &coef)) in x.iter().zip(&self.coefficients).enumerate() {
            let value = match &self.scaler {
                Some(s) => (value - s.mean[i]) / s.scale[i],
                None => value,
            };
            z += coef * value;
        }
        sigmoid(z)
    }
}

/// How tree outputs are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Gradient boosting: leaves are log-odds contributions.
    SumLogit,
    /// Random forest: leaves are class-1 probabilities, averaged.
    MeanProbability,
}

/// One tree node. A node without `feature` is a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub feature: Option<usize>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    #[serde(default)]
    pub value: f64,
}

impl Node {
    #[must_use]
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self {
            feature: Some(feature),
            threshold,
            left,
            right,
            value: 0.0,
        }
    }

    #[must_use]
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: None,
            threshold: 0.0,
            left: 0,
            right: 0,
            value,
        }
    }
}

/// Decision tree stored as a flat node array; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root: left when `x[feature] <= threshold`.
    fn evaluate(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            match node.feature {
                None => return node.value,
                Some(f) => {
                    idx = if x[f] <= node.threshold {
                        node.left
                    } else {
                        node.right
                    };
                }
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node.feature {
                None if !node.value.is_finite() => {
                    return Err(format!("leaf {idx} has a non-finite value"));
                }
                None => {}
                Some(f) => {
                    if f >= n_features {
                        return Err(format!("node {idx} splits on feature {f} of {n_features}"));
                    }
                    if node.threshold.is_nan() {
                        return Err(format!("node {idx} has a NaN threshold"));
                    }
                    // Children must point forward so evaluation always terminates.
                    for child in [node.left, node.right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Ensemble of decision trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    pub trees: Vec<Tree>,
    /// Initial log-odds for `sum_logit`; unused for `mean_probability`.
    #[serde(default)]
    pub base_score: f64,
    pub aggregation: Aggregation,
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), String> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err("tree ensemble has no features".into());
        }
        if self.trees.is_empty() {
            return Err("tree ensemble has no trees".into());
        }
        if !self.base_score.is_finite() {
            return Err("non-finite base score".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n).map_err(|e| format!("tree {i}: {e}"))?;
            if self.aggregation == Aggregation::MeanProbability
                && tree
                    .nodes
                    .iter()
                    .any(|node| node.feature.is_none() && !(0.0..=1.0).contains(&node.value))
            {
                return Err(format!("tree {i}: leaf probability outside [0, 1]"));
            }
        }
        Ok(())
    }

    fn positive_probability(&self, x: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.evaluate(x)).sum();
        match self.aggregation {
            Aggregation::SumLogit => sigmoid(self.base_score + total),
            Aggregation::MeanProbability => total / self.trees.len() as f64,
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Tree {
        Tree {
            nodes: vec![
                Node::split(feature, threshold, 1, 2),
                Node::leaf(left),
                Node::leaf(right),
            ],
        }
    }

    #[test]
    fn test_logistic_probability() {
        let model = ArtifactModel::Logistic(LogisticModel {
            feature_names: names(2),
            coefficients: vec![0.0, 0.0],
            intercept: 3.0_f64.ln(),
            scaler: None,
        });
        model.validate().expect("valid");
        let proba = model.predict_proba(&[10.0, -4.0]).expect("predict");
        assert!((proba[1] - 0.75).abs() < 1e-12);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&[10.0, -4.0]).expect("predict"), 1);
    }

    #[test]
    fn test_logistic_scaler_is_applied() {
        let model = ArtifactModel::Logistic(LogisticModel {
            feature_names: names(1),
            coefficients: vec![1.0],
            intercept: 0.0,
            scaler: Some(StandardScaler {
                mean: vec![20.0],
                scale: vec![2.0],
            }),
        });
        // (20 - 20) / 2 = 0 → sigmoid(0)
        let p = model.predict_proba(&[20.0]).expect("predict")[1];
        assert!((p - 0.5).abs() < 1e-12);
        assert_eq!(model.predict(&[20.0]).expect("predict"), 0);
        assert_eq!(model.predict(&[21.0]).expect("predict"), 1);
    }

    #[test]
    fn test_wrong_feature_count_is_schema_mismatch() {
        let model = ArtifactModel::Logistic(LogisticModel {
            feature_names: names(3),
            coefficients: vec![0.1, 0.2, 0.3],
            intercept: 0.0,
            scaler: None,
        });
        let err = model.predict_proba(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, InferenceError::SchemaMismatch(_)));
    }

    #[test]
    fn test_gradient_boosting_sums_log_odds() {
        let model = ArtifactModel::TreeEnsemble(TreeEnsemble {
            feature_names: names(2),
            trees: vec![stump(0, 5.0, -1.0, 1.0), stump(1, 0.5, -0.5, 0.5)],
            base_score: 0.25,
            aggregation: Aggregation::SumLogit,
        });
        model.validate().expect("valid");
        assert_eq!(model.kind(), "gradient_boosting");

        // left, right: 0.25 - 1.0 + 0.5
        let p = model.predict_proba(&[5.0, 1.0]).expect("predict")[1];
        assert!((p - sigmoid(-0.25)).abs() < 1e-12);
        // right, left: 0.25 + 1.0 - 0.5
        let p = model.predict_proba(&[6.0, 0.0]).expect("predict")[1];
        assert!((p - sigmoid(0.75)).abs() < 1e-12);
    }

    #[test]
    fn test_random_forest_averages_leaves() {
        let model = ArtifactModel::TreeEnsemble(TreeEnsemble {
            feature_names: names(1),
            trees: vec![stump(0, 1.0, 0.2, 0.9), stump(0, 3.0, 0.4, 0.6)],
            base_score: 0.0,
            aggregation: Aggregation::MeanProbability,
        });
        model.validate().expect("valid");
        let p = model.predict_proba(&[2.0]).expect("predict")[1];
        assert!((p - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_backward_children() {
        let model = ArtifactModel::TreeEnsemble(TreeEnsemble {
            feature_names: names(1),
            trees: vec![Tree {
                nodes: vec![Node::split(0, 1.0, 1, 2), Node::split(0, 0.0, 0, 2), Node::leaf(0.1)],
            }],
            base_score: 0.0,
            aggregation: Aggregation::SumLogit,
        });
        let err = model.validate().unwrap_err();
        assert!(err.contains("invalid child"), "{err}");
    }

    #[test]
    fn test_validate_rejects_out_of_range_split_feature() {
        let model = ArtifactModel::TreeEnsemble(TreeEnsemble {
            feature_names: names(1),
            trees: vec![stump(4, 1.0, 0.0, 1.0)],
            base_score: 0.0,
            aggregation: Aggregation::MeanProbability,
        });
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_mismatched_coefficients() {
        let model = ArtifactModel::Logistic(LogisticModel {
            feature_names: names(3),
            coefficients: vec![1.0],
            intercept: 0.0,
            scaler: None,
        });
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_bincode_artifact_decodes() {
        let artifact = Artifact {
            format_version: FORMAT_VERSION,
            horizon: Some(Horizon::ThreeYears),
            model: ArtifactModel::TreeEnsemble(TreeEnsemble {
                feature_names: names(1),
                trees: vec![stump(0, 1.0, 0.0, 1.0)],
                base_score: 0.0,
                aggregation: Aggregation::MeanProbability,
            }),
        };
        let bytes = artifact.encode(ArtifactEncoding::Bincode).expect("encode");
        let decoded = Artifact::decode(&bytes, ArtifactEncoding::Bincode).expect("decode");
        assert_eq!(decoded, artifact);
    }

    #[test]
    fn test_json_artifact_without_optional_fields() {
        let json = r#"{
            "format_version": 1,
            "model": {"logistic": {"feature_names": ["a"], "coefficients": [0.5], "intercept": 0.0}}
        }"#;
        let artifact = Artifact::decode(json.as_bytes(), ArtifactEncoding::Json).expect("decode");
        assert_eq!(artifact.horizon, None);
        assert_eq!(artifact.model.kind(), "logistic");
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(ArtifactEncoding::from_extension("JSON"), Some(ArtifactEncoding::Json));
        assert_eq!(ArtifactEncoding::from_extension("bin"), Some(ArtifactEncoding::Bincode));
        assert_eq!(ArtifactEncoding::from_extension("pkl"), None);
    }
}
