//! Submission validation and label-to-code encoding.

use super::features::{FeatureRecord, Horizon};
use super::questionnaire::{Field, FieldKind};
use super::submission::Submission;

/// Aggregate validation failure for one submission.
///
/// Reported once for the whole submission, never field by field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", self.message())]
pub struct ValidationError {
    /// Items left unselected or unanswered, in declared order.
    pub missing: Vec<Field>,
    /// Items whose answer is outside the declared vocabulary or range.
    pub invalid: Vec<(Field, String)>,
}

impl ValidationError {
    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> String {
        if !self.missing.is_empty() {
            "all required fields must be filled".to_string()
        } else {
            let names: Vec<&str> = self.invalid.iter().map(|(f, _)| f.name()).collect();
            format!("unrecognized answers for: {}", names.join(", "))
        }
    }
}

/// Validate a submission and encode it into a feature record.
///
/// # Errors
/// Returns a single `ValidationError` listing every unanswered or
/// unrecognized item.
pub fn encode(submission: &Submission) -> Result<FeatureRecord, ValidationError> {
    let mut codes = [0u8; Field::COUNT];
    let mut missing = Vec::new();
    let mut invalid = Vec::new();

    for field in Field::ALL {
        let spec = field.spec();
        match spec.kind {
            FieldKind::Categorical(_) => {
                let label = submission.label(field).unwrap_or_default().trim();
                if label.is_empty() {
                    missing.push(field);
                    continue;
                }
                match spec.code_for(label) {
                    Some(code) => codes[field.index()] = code,
                    None => invalid.push((field, label.to_string())),
                }
            }
            FieldKind::Numeric(range) => {
                let value = match field {
                    Field::Grade => submission.grade,
                    _ => submission.bmi,
                };
                match value {
                    None => missing.push(field),
                    Some(v) if v.is_nan() => missing.push(field),
                    Some(v) if !range.contains(v) => invalid.push((field, v.to_string())),
                    // Grades are whole school years.
                    Some(v) if field == Field::Grade && v.fract() != 0.0 => {
                        invalid.push((field, v.to_string()));
                    }
                    Some(_) => {}
                }
            }
        }
    }

    if !missing.is_empty() || !invalid.is_empty() {
        tracing::debug!(
            missing = missing.len(),
            invalid = invalid.len(),
            "Submission rejected"
        );
        return Err(ValidationError { missing, invalid });
    }

    let code = |field: Field| codes[field.index()];
    let year = Horizon::try_from(code(Field::Year)).map_err(|reason| ValidationError {
        missing: Vec::new(),
        invalid: vec![(Field::Year, reason)],
    })?;

    Ok(FeatureRecord {
        year,
        grade: submission.grade.map_or(0, |g| g as u32),
        sex: code(Field::Sex),
        resident: code(Field::Resident),
        bmi: submission.bmi.unwrap_or_default(),
        parental_myopia: code(Field::ParentalMyopia),
        parental_education: code(Field::ParentalEducation),
        academic_pressure: code(Field::AcademicPressure),
        bad_writing_habits: code(Field::BadWritingHabits),
        work_study_time_per_day: code(Field::WorkStudyTimePerDay),
        continuous_work_study_time_per_day: code(Field::ContinuousWorkStudyTimePerDay),
        screen_time: code(Field::ScreenTime),
        sleep_time: code(Field::SleepTime),
        outdoor_time: code(Field::OutdoorTime),
        frequency_of_sugary_snack: code(Field::FrequencyOfSugarySnack),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::questionnaire::field_specs;

    fn categorical_fields() -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| f.is_categorical()).collect()
    }

    #[test]
    fn test_example_encodes_to_expected_row() {
        let record = encode(&Submission::example()).expect("example is complete");
        let expected = [
            1.0, 7.0, 1.0, 1.0, 19.5, 1.0, 2.0, 0.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0,
        ];
        assert_eq!(record.values(), expected);
        assert_eq!(record.horizon(), Horizon::OneYear);
    }

    #[test]
    fn test_every_label_maps_to_its_declared_code() {
        for spec in field_specs() {
            for choice in spec.choices() {
                for label in std::iter::once(&choice.label).chain(choice.aliases.iter()) {
                    let mut submission = Submission::example();
                    submission.set_label(spec.field, *label);
                    let record = encode(&submission)
                        .unwrap_or_else(|e| panic!("{} = {label}: {e}", spec.field));
                    assert_eq!(
                        record.get(spec.field),
                        f64::from(choice.code),
                        "{} = {label}",
                        spec.field
                    );
                }
            }
        }
    }

    #[test]
    fn test_any_unselected_subset_fails_as_one_error() {
        let fields = categorical_fields();
        assert_eq!(fields.len(), 13);

        for mask in 1u32..(1 << fields.len()) {
            let mut submission = Submission::example();
            let mut cleared = Vec::new();
            for (bit, field) in fields.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    submission.clear(*field);
                    cleared.push(*field);
                }
            }

            let err = encode(&submission).expect_err("incomplete submission must fail");
            assert_eq!(err.missing, cleared, "mask {mask:#b}");
            assert!(err.invalid.is_empty());
            assert_eq!(err.to_string(), "all required fields must be filled");
        }
    }

    #[test]
    fn test_resident_unselected_is_rejected() {
        let mut submission = Submission::example();
        submission.resident.clear();
        let err = encode(&submission).unwrap_err();
        assert_eq!(err.missing, vec![Field::Resident]);
    }

    #[test]
    fn test_numeric_fields_require_an_answer() {
        let mut submission = Submission::example();
        submission.grade = None;
        submission.bmi = None;
        let err = encode(&submission).unwrap_err();
        assert_eq!(err.missing, vec![Field::Grade, Field::Bmi]);

        submission.bmi = Some(f64::NAN);
        submission.grade = Some(3.0);
        assert_eq!(encode(&submission).unwrap_err().missing, vec![Field::Bmi]);
    }

    #[test]
    fn test_range_minimum_is_a_valid_answer() {
        let mut submission = Submission::example();
        submission.grade = Some(0.0);
        submission.bmi = Some(0.0);
        let record = encode(&submission).expect("minimum is accepted");
        assert_eq!(record.grade(), 0);
        assert!(record.bmi().abs() < f64::EPSILON);
    }

    #[test]
    fn test_out_of_range_numbers_are_invalid() {
        let mut submission = Submission::example();
        submission.grade = Some(101.0);
        submission.bmi = Some(-1.0);
        let err = encode(&submission).unwrap_err();
        assert!(err.missing.is_empty());
        let fields: Vec<Field> = err.invalid.iter().map(|(f, _)| *f).collect();
        assert_eq!(fields, vec![Field::Grade, Field::Bmi]);
        assert!(err.to_string().contains("Grade"));
    }

    #[test]
    fn test_fractional_or_negative_grade_is_invalid() {
        for grade in [7.5, -1.0] {
            let mut submission = Submission::example();
            submission.grade = Some(grade);
            let err = encode(&submission).unwrap_err();
            assert!(err.missing.is_empty());
            assert_eq!(err.invalid, vec![(Field::Grade, grade.to_string())]);
        }
    }

    #[test]
    fn test_whole_float_grade_encodes() {
        let mut submission = Submission::example();
        submission.grade = Some(12.0);
        let record = encode(&submission).expect("whole grade");
        assert_eq!(record.grade(), 12);
    }

    #[test]
    fn test_unknown_label_is_invalid() {
        let mut submission = Submission::example();
        submission.sleep_time = "12h".into();
        let err = encode(&submission).unwrap_err();
        assert_eq!(err.invalid, vec![(Field::SleepTime, "12h".to_string())]);
    }

    #[test]
    fn test_bmi_keeps_precision() {
        let mut submission = Submission::example();
        submission.bmi = Some(21.37);
        let record = encode(&submission).expect("valid");
        assert!((record.get(Field::Bmi) - 21.37).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_order_is_independent_of_input_order() {
        let example = Submission::example();
        let mut pairs: Vec<(&str, String)> = Field::ALL
            .iter()
            .map(|f| {
                let value = match f {
                    Field::Grade => example.grade.map(|g| g.to_string()).unwrap_or_default(),
                    Field::Bmi => example.bmi.map(|b| b.to_string()).unwrap_or_default(),
                    _ => example.label(*f).unwrap_or_default().to_string(),
                };
                (f.name(), value)
            })
            .collect();
        pairs.reverse();
        pairs.rotate_left(4);

        let shuffled = Submission::from_pairs(pairs).expect("valid pairs");
        let a = encode(&example).expect("valid");
        let b = encode(&shuffled).expect("valid");
        assert_eq!(a.values(), b.values());
        let order: Vec<Field> = b.iter().map(|(f, _)| f).collect();
        assert_eq!(order, Field::ALL.to_vec());
    }

    #[test]
    fn test_three_year_horizon() {
        let mut submission = Submission::example();
        submission.year = "3 years".into();
        let record = encode(&submission).expect("valid");
        assert_eq!(record.horizon(), Horizon::ThreeYears);
        assert!((record.get(Field::Year) - 3.0).abs() < f64::EPSILON);
    }
}
