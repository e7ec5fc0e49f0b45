//! Questionnaire definition: the fixed set of items and their answer vocabularies.
//!
//! The table in this module is the single source of truth for how a displayed
//! answer becomes the integer code the classifiers were trained on. It is a
//! `static` and has no mutation path.

use serde::{Deserialize, Serialize};

/// One questionnaire item, in the order the classifiers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Year,
    Grade,
    Sex,
    Resident,
    #[serde(rename = "BMI")]
    Bmi,
    #[serde(rename = "Parental_myopia")]
    ParentalMyopia,
    #[serde(rename = "Parental_education")]
    ParentalEducation,
    #[serde(rename = "Academic_pressure")]
    AcademicPressure,
    #[serde(rename = "Bad_writing_habits")]
    BadWritingHabits,
    #[serde(rename = "Work_study_time_per_day")]
    WorkStudyTimePerDay,
    #[serde(rename = "Continuous_work_study_time_per_day")]
    ContinuousWorkStudyTimePerDay,
    #[serde(rename = "Screen_time")]
    ScreenTime,
    #[serde(rename = "Sleep_time")]
    SleepTime,
    #[serde(rename = "Outdoor_time")]
    OutdoorTime,
    #[serde(rename = "Frequency_of_sugary_snack")]
    FrequencyOfSugarySnack,
}

impl Field {
    /// Number of questionnaire items.
    pub const COUNT: usize = 15;

    /// All items in declared order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Year,
        Field::Grade,
        Field::Sex,
        Field::Resident,
        Field::Bmi,
        Field::ParentalMyopia,
        Field::ParentalEducation,
        Field::AcademicPressure,
        Field::BadWritingHabits,
        Field::WorkStudyTimePerDay,
        Field::ContinuousWorkStudyTimePerDay,
        Field::ScreenTime,
        Field::SleepTime,
        Field::OutdoorTime,
        Field::FrequencyOfSugarySnack,
    ];

    /// Column name used by the model artifacts and the display payload.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Grade => "Grade",
            Self::Sex => "Sex",
            Self::Resident => "Resident",
            Self::Bmi => "BMI",
            Self::ParentalMyopia => "Parental_myopia",
            Self::ParentalEducation => "Parental_education",
            Self::AcademicPressure => "Academic_pressure",
            Self::BadWritingHabits => "Bad_writing_habits",
            Self::WorkStudyTimePerDay => "Work_study_time_per_day",
            Self::ContinuousWorkStudyTimePerDay => "Continuous_work_study_time_per_day",
            Self::ScreenTime => "Screen_time",
            Self::SleepTime => "Sleep_time",
            Self::OutdoorTime => "Outdoor_time",
            Self::FrequencyOfSugarySnack => "Frequency_of_sugary_snack",
        }
    }

    /// Look up an item by its column name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Position of this item in the feature record.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Static specification for this item.
    #[must_use]
    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_SPECS[self.index()]
    }

    /// Whether the item is answered by picking a label.
    #[must_use]
    pub fn is_categorical(self) -> bool {
        matches!(self.spec().kind, FieldKind::Categorical(_))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One selectable answer of a categorical item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    /// Canonical display label.
    pub label: &'static str,
    /// Integer code fed to the classifier.
    pub code: u8,
    /// Labels from the earlier form revision that map to the same code.
    pub aliases: &'static [&'static str],
}

impl Choice {
    const fn new(label: &'static str, code: u8) -> Self {
        Self {
            label,
            code,
            aliases: &[],
        }
    }

    const fn with_aliases(label: &'static str, code: u8, aliases: &'static [&'static str]) -> Self {
        Self {
            label,
            code,
            aliases,
        }
    }

    /// Whether `label` selects this choice.
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        self.label == label || self.aliases.contains(&label)
    }
}

/// Declared bounds of a numeric item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl NumericRange {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && (self.min..=self.max).contains(&value)
    }

    /// Clamp `value` into range.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Categorical(&'static [Choice]),
    Numeric(NumericRange),
}

/// Static description of one questionnaire item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub field: Field,
    /// Question shown to the respondent.
    pub prompt: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Allowed choices, empty for numeric items.
    #[must_use]
    pub fn choices(&self) -> &'static [Choice] {
        match self.kind {
            FieldKind::Categorical(choices) => choices,
            FieldKind::Numeric(_) => &[],
        }
    }

    #[must_use]
    pub fn range(&self) -> Option<NumericRange> {
        match self.kind {
            FieldKind::Numeric(range) => Some(range),
            FieldKind::Categorical(_) => None,
        }
    }

    /// Resolve a label to its choice.
    #[must_use]
    pub fn choice_for(&self, label: &str) -> Option<&'static Choice> {
        self.choices().iter().find(|c| c.matches(label))
    }

    /// Resolve a label to its integer code.
    #[must_use]
    pub fn code_for(&self, label: &str) -> Option<u8> {
        self.choice_for(label).map(|c| c.code)
    }
}

const YEAR: &[Choice] = &[Choice::new("1 year", 1), Choice::new("3 years", 3)];

const SEX: &[Choice] = &[
    Choice::with_aliases("Boy", 1, &["Man"]),
    Choice::with_aliases("Girl", 2, &["Woman"]),
];

const RESIDENT: &[Choice] = &[
    Choice::with_aliases("Urban", 1, &["urban"]),
    Choice::with_aliases("Village", 0, &["village"]),
];

const YES_NO: &[Choice] = &[Choice::new("Yes", 1), Choice::new("No", 0)];

const EDUCATION: &[Choice] = &[
    Choice::new("High school and below", 1),
    Choice::new("Bachelor", 2),
    Choice::new("Master or above", 3),
];

const HABIT_COUNT: &[Choice] = &[
    Choice::new("0", 0),
    Choice::new("1", 1),
    Choice::new("2", 2),
    Choice::new("3", 3),
    Choice::new("4", 4),
    Choice::new("5", 5),
];

const STUDY_TIME: &[Choice] = &[
    Choice::new("<6h", 1),
    Choice::new("6-8h", 2),
    Choice::new("8-10h", 3),
    Choice::new(">10h", 4),
];

const HOURS_UP_TO_3: &[Choice] = &[
    Choice::new("<1h", 1),
    Choice::new("1-2h", 2),
    Choice::new("2-3h", 3),
    Choice::new(">3h", 4),
];

const SCREEN_TIME: &[Choice] = &[
    Choice::new("<0.5h", 1),
    Choice::new("0.5-1h", 2),
    Choice::new("1-2h", 3),
    Choice::new(">2h", 4),
];

const SLEEP_TIME: &[Choice] = &[
    Choice::new("<7h", 1),
    Choice::new("7-9h", 2),
    Choice::new(">9h", 3),
];

const SNACK_FREQUENCY: &[Choice] = &[
    Choice::with_aliases("Less than once per month", 1, &["less than once per month"]),
    Choice::with_aliases("Monthly", 2, &["monthly"]),
    Choice::with_aliases("Weekly", 3, &["weekly"]),
    Choice::with_aliases("Daily", 4, &["daily"]),
];

const fn categorical(field: Field, prompt: &'static str, choices: &'static [Choice]) -> FieldSpec {
    FieldSpec {
        field,
        prompt,
        kind: FieldKind::Categorical(choices),
    }
}

const fn numeric(field: Field, prompt: &'static str, min: f64, max: f64, step: f64) -> FieldSpec {
    FieldSpec {
        field,
        prompt,
        kind: FieldKind::Numeric(NumericRange { min, max, step }),
    }
}

static FIELD_SPECS: [FieldSpec; Field::COUNT] = [
    categorical(Field::Year, "Number of years", YEAR),
    numeric(Field::Grade, "Grade", 0.0, 100.0, 1.0),
    categorical(Field::Sex, "Sex", SEX),
    categorical(Field::Resident, "Resident", RESIDENT),
    numeric(Field::Bmi, "BMI", 0.0, 100.0, 0.1),
    categorical(
        Field::ParentalMyopia,
        "Do either of your parents have myopia?",
        YES_NO,
    ),
    categorical(
        Field::ParentalEducation,
        "Your parents educational background?",
        EDUCATION,
    ),
    categorical(Field::AcademicPressure, "Do you have academic pressure?", YES_NO),
    categorical(
        Field::BadWritingHabits,
        "How many bad writing habits do you have?",
        HABIT_COUNT,
    ),
    categorical(Field::WorkStudyTimePerDay, "Working/Studying time per day", STUDY_TIME),
    categorical(
        Field::ContinuousWorkStudyTimePerDay,
        "Continuous working/studying time per day",
        HOURS_UP_TO_3,
    ),
    categorical(Field::ScreenTime, "Screen time per day", SCREEN_TIME),
    categorical(Field::SleepTime, "Sleeping time per day", SLEEP_TIME),
    categorical(Field::OutdoorTime, "Outdoor time per day", HOURS_UP_TO_3),
    categorical(
        Field::FrequencyOfSugarySnack,
        "Frequency of sugary snack",
        SNACK_FREQUENCY,
    ),
];

/// The full questionnaire in declared order.
#[must_use]
pub fn field_specs() -> &'static [FieldSpec; Field::COUNT] {
    &FIELD_SPECS
}
