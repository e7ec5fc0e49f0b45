//! Prediction result types.

use serde::{Deserialize, Serialize};

use super::features::Horizon;

/// Which classifier capability to call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Positive-class probability (index 1 of the probability vector).
    #[default]
    Probability,
    /// Hard class label.
    Label,
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "probability" | "proba" => Ok(Self::Probability),
            "label" | "class" => Ok(Self::Label),
            other => Err(format!(
                "unknown output mode '{other}' (expected 'probability' or 'label')"
            )),
        }
    }
}

/// Raw classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// 1 = myopia present, 0 = absent.
    Label(u8),
    /// Probability of myopia, 0.0 to 1.0.
    Probability(f64),
}

/// Risk band used when presenting a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - keep up current habits",
            Self::Moderate => "Moderate risk - consider an eye examination",
            Self::High => "High risk - an eye examination is recommended",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Prediction for one feature record, tagged with the horizon that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub horizon: Horizon,
    pub outcome: Outcome,
}

impl PredictionResult {
    #[must_use]
    pub fn probability(horizon: Horizon, probability: f64) -> Self {
        Self {
            horizon,
            outcome: Outcome::Probability(probability),
        }
    }

    #[must_use]
    pub fn label(horizon: Horizon, label: u8) -> Self {
        Self {
            horizon,
            outcome: Outcome::Label(label),
        }
    }

    /// Risk band: probability < 0.3 low, < 0.7 moderate, otherwise high.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        match self.outcome {
            Outcome::Label(0) => RiskLevel::Low,
            Outcome::Label(_) => RiskLevel::High,
            Outcome::Probability(p) if p < 0.3 => RiskLevel::Low,
            Outcome::Probability(p) if p < 0.7 => RiskLevel::Moderate,
            Outcome::Probability(_) => RiskLevel::High,
        }
    }
}

impl std::fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome {
            Outcome::Probability(p) => write!(
                f,
                "{} myopia probability: {:.1}% ({})",
                self.horizon,
                p * 100.0,
                self.risk_level()
            ),
            Outcome::Label(label) => write!(
                f,
                "{} predicted outcome: {} ({})",
                self.horizon,
                label,
                if label == 0 { "no myopia" } else { "myopia" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_probability() {
        let r = |p| PredictionResult::probability(Horizon::OneYear, p).risk_level();
        assert_eq!(r(0.1), RiskLevel::Low);
        assert_eq!(r(0.3), RiskLevel::Moderate);
        assert_eq!(r(0.5), RiskLevel::Moderate);
        assert_eq!(r(0.9), RiskLevel::High);
    }

    #[test]
    fn test_risk_level_from_label() {
        assert_eq!(
            PredictionResult::label(Horizon::ThreeYears, 0).risk_level(),
            RiskLevel::Low
        );
        assert_eq!(
            PredictionResult::label(Horizon::ThreeYears, 1).risk_level(),
            RiskLevel::High
        );
    }

    #[test]
    fn test_display_is_tagged_with_horizon() {
        let p = PredictionResult::probability(Horizon::ThreeYears, 0.4213);
        assert_eq!(p.to_string(), "3-year myopia probability: 42.1% (MODERATE)");

        let l = PredictionResult::label(Horizon::OneYear, 1);
        assert_eq!(l.to_string(), "1-year predicted outcome: 1 (myopia)");
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("probability".parse::<OutputMode>(), Ok(OutputMode::Probability));
        assert_eq!(" Label ".parse::<OutputMode>(), Ok(OutputMode::Label));
        assert!("score".parse::<OutputMode>().is_err());
        assert_eq!(OutputMode::default(), OutputMode::Probability);
    }
}
