//! Encoded feature record handed to the classifiers.

use serde::{Deserialize, Serialize};

use super::questionnaire::Field;

/// Prediction window. Each horizon has its own model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Horizon {
    OneYear,
    ThreeYears,
}

impl Horizon {
    pub const ALL: [Horizon; 2] = [Horizon::OneYear, Horizon::ThreeYears];

    /// Value of the `Year` feature.
    #[must_use]
    pub fn years(self) -> u8 {
        match self {
            Self::OneYear => 1,
            Self::ThreeYears => 3,
        }
    }

    /// Dense index, used for per-horizon slots.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::OneYear => 0,
            Self::ThreeYears => 1,
        }
    }
}

impl From<Horizon> for u8 {
    fn from(h: Horizon) -> Self {
        h.years()
    }
}

impl TryFrom<u8> for Horizon {
    type Error = String;

    fn try_from(years: u8) -> Result<Self, Self::Error> {
        match years {
            1 => Ok(Self::OneYear),
            3 => Ok(Self::ThreeYears),
            other => Err(format!("Year must be 1 or 3, got {other}")),
        }
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneYear => write!(f, "1-year"),
            Self::ThreeYears => write!(f, "3-year"),
        }
    }
}

/// Number of features the classifiers consume (every field except `Year`).
pub const MODEL_FEATURE_COUNT: usize = Field::COUNT - 1;

/// Fixed-order encoded answers.
///
/// Only the encoder builds these, so every field is populated and `year`
/// is one of the two supported horizons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRecord {
    #[serde(rename = "Year")]
    pub(crate) year: Horizon,
    #[serde(rename = "Grade")]
    pub(crate) grade: u32,
    #[serde(rename = "Sex")]
    pub(crate) sex: u8,
    #[serde(rename = "Resident")]
    pub(crate) resident: u8,
    #[serde(rename = "BMI")]
    pub(crate) bmi: f64,
    #[serde(rename = "Parental_myopia")]
    pub(crate) parental_myopia: u8,
    #[serde(rename = "Parental_education")]
    pub(crate) parental_education: u8,
    #[serde(rename = "Academic_pressure")]
    pub(crate) academic_pressure: u8,
    #[serde(rename = "Bad_writing_habits")]
    pub(crate) bad_writing_habits: u8,
    #[serde(rename = "Work_study_time_per_day")]
    pub(crate) work_study_time_per_day: u8,
    #[serde(rename = "Continuous_work_study_time_per_day")]
    pub(crate) continuous_work_study_time_per_day: u8,
    #[serde(rename = "Screen_time")]
    pub(crate) screen_time: u8,
    #[serde(rename = "Sleep_time")]
    pub(crate) sleep_time: u8,
    #[serde(rename = "Outdoor_time")]
    pub(crate) outdoor_time: u8,
    #[serde(rename = "Frequency_of_sugary_snack")]
    pub(crate) frequency_of_sugary_snack: u8,
}

impl FeatureRecord {
    #[must_use]
    pub fn horizon(&self) -> Horizon {
        self.year
    }

    #[must_use]
    pub fn grade(&self) -> u32 {
        self.grade
    }

    #[must_use]
    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    /// Encoded value of a single field.
    #[must_use]
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Year => f64::from(self.year.years()),
            Field::Grade => f64::from(self.grade),
            Field::Sex => f64::from(self.sex),
            Field::Resident => f64::from(self.resident),
            Field::Bmi => self.bmi,
            Field::ParentalMyopia => f64::from(self.parental_myopia),
            Field::ParentalEducation => f64::from(self.parental_education),
            Field::AcademicPressure => f64::from(self.academic_pressure),
            Field::BadWritingHabits => f64::from(self.bad_writing_habits),
            Field::WorkStudyTimePerDay => f64::from(self.work_study_time_per_day),
            Field::ContinuousWorkStudyTimePerDay => {
                f64::from(self.continuous_work_study_time_per_day)
            }
            Field::ScreenTime => f64::from(self.screen_time),
            Field::SleepTime => f64::from(self.sleep_time),
            Field::OutdoorTime => f64::from(self.outdoor_time),
            Field::FrequencyOfSugarySnack => f64::from(self.frequency_of_sugary_snack),
        }
    }

    /// All 15 values in declared order.
    #[must_use]
    pub fn values(&self) -> [f64; Field::COUNT] {
        Field::ALL.map(|field| self.get(field))
    }

    /// The 14 values after `Year`, in the positional order the classifiers expect.
    #[must_use]
    pub fn model_input(&self) -> [f64; MODEL_FEATURE_COUNT] {
        let mut out = [0.0; MODEL_FEATURE_COUNT];
        for (slot, field) in out.iter_mut().zip(&Field::ALL[1..]) {
            *slot = self.get(*field);
        }
        out
    }

    /// Values paired with their field, in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, f64)> + '_ {
        Field::ALL.into_iter().map(move |field| (field, self.get(field)))
    }
}

/// Column names of [`FeatureRecord::model_input`].
#[must_use]
pub fn model_feature_names() -> [&'static str; MODEL_FEATURE_COUNT] {
    let mut names = [""; MODEL_FEATURE_COUNT];
    for (slot, field) in names.iter_mut().zip(&Field::ALL[1..]) {
        *slot = field.name();
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> FeatureRecord {
        FeatureRecord {
            year: Horizon::ThreeYears,
            grade: 4,
            sex: 2,
            resident: 0,
            bmi: 16.3,
            parental_myopia: 0,
            parental_education: 3,
            academic_pressure: 1,
            bad_writing_habits: 5,
            work_study_time_per_day: 4,
            continuous_work_study_time_per_day: 3,
            screen_time: 1,
            sleep_time: 3,
            outdoor_time: 4,
            frequency_of_sugary_snack: 1,
        }
    }

    #[test]
    fn test_horizon_codes() {
        assert_eq!(Horizon::try_from(1u8), Ok(Horizon::OneYear));
        assert_eq!(Horizon::try_from(3u8), Ok(Horizon::ThreeYears));
        assert!(Horizon::try_from(2u8).is_err());
        assert!(Horizon::try_from(5u8).is_err());
        assert_eq!(u8::from(Horizon::ThreeYears), 3);
    }

    #[test]
    fn test_horizon_serializes_as_year_number() {
        let json = serde_json::to_string(&Horizon::OneYear).expect("serialize");
        assert_eq!(json, "1");
        let parsed: Result<Horizon, _> = serde_json::from_str("2");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_model_input_drops_year() {
        let record = sample_record();
        let input = record.model_input();
        assert_eq!(input.len(), 14);
        assert!((input[0] - 4.0).abs() < f64::EPSILON);
        assert!((input[3] - 16.3).abs() < f64::EPSILON);
        assert!((input[13] - 1.0).abs() < f64::EPSILON);
        assert_eq!(&record.values()[1..], &input[..]);
    }

    #[test]
    fn test_model_feature_names_follow_field_order() {
        let names = model_feature_names();
        assert_eq!(names[0], "Grade");
        assert_eq!(names[3], "BMI");
        assert_eq!(names[13], "Frequency_of_sugary_snack");
    }

    #[test]
    fn test_serialized_columns_keep_declared_order() {
        let json = serde_json::to_string(&sample_record()).expect("serialize");
        let positions: Vec<usize> = Field::ALL
            .iter()
            .map(|f| json.find(&format!("\"{}\":", f.name())).expect("column present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
        assert!(json.starts_with("{\"Year\":3,\"Grade\":4,"));
    }
}
