//! Raw questionnaire answers as supplied by a front end.

use serde::{Deserialize, Serialize};

use super::questionnaire::Field;

/// Errors raised while assembling a submission from loosely typed pairs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("unknown questionnaire field: {0}")]
    UnknownField(String),

    #[error("{field}: '{value}' is not a number")]
    InvalidNumber { field: Field, value: String },
}

/// One respondent's answers, before validation.
///
/// Categorical answers are display labels; the empty string means the item
/// was left unselected. `grade` and `bmi` are `None` until answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Submission {
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "Grade", default)]
    pub grade: Option<f64>,
    #[serde(rename = "Sex", default)]
    pub sex: String,
    #[serde(rename = "Resident", default)]
    pub resident: String,
    #[serde(rename = "BMI", default)]
    pub bmi: Option<f64>,
    #[serde(rename = "Parental_myopia", default)]
    pub parental_myopia: String,
    #[serde(rename = "Parental_education", default)]
    pub parental_education: String,
    #[serde(rename = "Academic_pressure", default)]
    pub academic_pressure: String,
    #[serde(rename = "Bad_writing_habits", default)]
    pub bad_writing_habits: String,
    #[serde(rename = "Work_study_time_per_day", default)]
    pub work_study_time_per_day: String,
    #[serde(rename = "Continuous_work_study_time_per_day", default)]
    pub continuous_work_study_time_per_day: String,
    #[serde(rename = "Screen_time", default)]
    pub screen_time: String,
    #[serde(rename = "Sleep_time", default)]
    pub sleep_time: String,
    #[serde(rename = "Outdoor_time", default)]
    pub outdoor_time: String,
    #[serde(rename = "Frequency_of_sugary_snack", default)]
    pub frequency_of_sugary_snack: String,
}

impl Submission {
    /// Build a submission from `(field name, value)` pairs in any order.
    ///
    /// Numeric items are parsed; an empty value leaves the item unanswered.
    ///
    /// # Errors
    /// Returns `InputError` for an unknown field name or an unparsable number.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut submission = Self::default();
        for (name, value) in pairs {
            let field = Field::from_name(name.as_ref())
                .ok_or_else(|| InputError::UnknownField(name.as_ref().to_string()))?;
            submission.set_text(field, value.as_ref())?;
        }
        Ok(submission)
    }

    /// Set an item from its textual form.
    ///
    /// # Errors
    /// Returns `InputError::InvalidNumber` if a numeric item does not parse.
    pub fn set_text(&mut self, field: Field, value: &str) -> Result<(), InputError> {
        let value = value.trim();
        let invalid = || InputError::InvalidNumber {
            field,
            value: value.to_string(),
        };
        match field {
            Field::Grade => {
                self.grade = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| invalid())?)
                };
            }
            Field::Bmi => {
                self.bmi = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| invalid())?)
                };
            }
            _ => {
                if let Some(slot) = self.label_mut(field) {
                    *slot = value.to_string();
                }
            }
        }
        Ok(())
    }

    /// Label chosen for a categorical item; `None` for numeric items.
    #[must_use]
    pub fn label(&self, field: Field) -> Option<&str> {
        let label = match field {
            Field::Year => &self.year,
            Field::Sex => &self.sex,
            Field::Resident => &self.resident,
            Field::ParentalMyopia => &self.parental_myopia,
            Field::ParentalEducation => &self.parental_education,
            Field::AcademicPressure => &self.academic_pressure,
            Field::BadWritingHabits => &self.bad_writing_habits,
            Field::WorkStudyTimePerDay => &self.work_study_time_per_day,
            Field::ContinuousWorkStudyTimePerDay => &self.continuous_work_study_time_per_day,
            Field::ScreenTime => &self.screen_time,
            Field::SleepTime => &self.sleep_time,
            Field::OutdoorTime => &self.outdoor_time,
            Field::FrequencyOfSugarySnack => &self.frequency_of_sugary_snack,
            Field::Grade | Field::Bmi => return None,
        };
        Some(label.as_str())
    }

    /// Replace the label of a categorical item. Numeric items are ignored.
    pub fn set_label(&mut self, field: Field, label: impl Into<String>) {
        if let Some(slot) = self.label_mut(field) {
            *slot = label.into();
        }
    }

    /// Reset an item to its unselected state.
    pub fn clear(&mut self, field: Field) {
        match field {
            Field::Grade => self.grade = None,
            Field::Bmi => self.bmi = None,
            _ => self.set_label(field, String::new()),
        }
    }

    fn label_mut(&mut self, field: Field) -> Option<&mut String> {
        let label = match field {
            Field::Year => &mut self.year,
            Field::Sex => &mut self.sex,
            Field::Resident => &mut self.resident,
            Field::ParentalMyopia => &mut self.parental_myopia,
            Field::ParentalEducation => &mut self.parental_education,
            Field::AcademicPressure => &mut self.academic_pressure,
            Field::BadWritingHabits => &mut self.bad_writing_habits,
            Field::WorkStudyTimePerDay => &mut self.work_study_time_per_day,
            Field::ContinuousWorkStudyTimePerDay => &mut self.continuous_work_study_time_per_day,
            Field::ScreenTime => &mut self.screen_time,
            Field::SleepTime => &mut self.sleep_time,
            Field::OutdoorTime => &mut self.outdoor_time,
            Field::FrequencyOfSugarySnack => &mut self.frequency_of_sugary_snack,
            Field::Grade | Field::Bmi => return None,
        };
        Some(label)
    }

    /// A fully answered example: a 7th-grade urban boy, 1-year horizon.
    #[must_use]
    pub fn example() -> Self {
        Self {
            year: "1 year".into(),
            grade: Some(7.0),
            sex: "Boy".into(),
            resident: "Urban".into(),
            bmi: Some(19.5),
            parental_myopia: "Yes".into(),
            parental_education: "Bachelor".into(),
            academic_pressure: "No".into(),
            bad_writing_habits: "2".into(),
            work_study_time_per_day: "6-8h".into(),
            continuous_work_study_time_per_day: "1-2h".into(),
            screen_time: "0.5-1h".into(),
            sleep_time: "7-9h".into(),
            outdoor_time: "1-2h".into(),
            frequency_of_sugary_snack: "Weekly".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_ignores_arrival_order() {
        let forward = Submission::from_pairs([("Year", "3 years"), ("Grade", "5"), ("BMI", "17.25")])
            .expect("valid pairs");
        let reversed = Submission::from_pairs([("BMI", "17.25"), ("Grade", "5"), ("Year", "3 years")])
            .expect("valid pairs");
        assert_eq!(forward, reversed);
        assert_eq!(forward.grade, Some(5.0));
        assert_eq!(forward.label(Field::Year), Some("3 years"));
    }

    #[test]
    fn test_from_pairs_rejects_unknown_field() {
        let err = Submission::from_pairs([("Eye_color", "brown")]).unwrap_err();
        assert_eq!(err, InputError::UnknownField("Eye_color".into()));
    }

    #[test]
    fn test_from_pairs_rejects_bad_number() {
        let err = Submission::from_pairs([("Grade", "seven")]).unwrap_err();
        assert!(matches!(err, InputError::InvalidNumber { field: Field::Grade, .. }));
    }

    #[test]
    fn test_empty_numeric_text_means_unanswered() {
        let mut s = Submission::example();
        s.set_text(Field::Bmi, "  ").expect("empty is allowed");
        assert_eq!(s.bmi, None);
    }

    #[test]
    fn test_numeric_fields_have_no_label() {
        let s = Submission::example();
        assert_eq!(s.label(Field::Grade), None);
        assert_eq!(s.label(Field::Bmi), None);
        assert_eq!(s.label(Field::Sex), Some("Boy"));
    }

    #[test]
    fn test_clear_resets_items() {
        let mut s = Submission::example();
        s.clear(Field::Resident);
        s.clear(Field::Grade);
        assert_eq!(s.label(Field::Resident), Some(""));
        assert_eq!(s.grade, None);
    }

    #[test]
    fn test_json_uses_column_names() {
        let json = r#"{"Year":"1 year","Grade":7,"BMI":19.5,"Sex":"Boy"}"#;
        let s: Submission = serde_json::from_str(json).expect("parse");
        assert_eq!(s.grade, Some(7.0));
        assert_eq!(s.sex, "Boy");
        assert_eq!(s.resident, "");

        let unknown: Result<Submission, _> = serde_json::from_str(r#"{"Height":120}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_json_grade_accepts_any_number() {
        let whole: Submission = serde_json::from_str(r#"{"Grade":7.0}"#).expect("float grade");
        assert_eq!(whole.grade, Some(7.0));
        let negative: Submission = serde_json::from_str(r#"{"Grade":-1}"#).expect("negative grade");
        assert_eq!(negative.grade, Some(-1.0));
    }
}
