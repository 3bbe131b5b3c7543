//! Data structures describing the survey responses fed into the report.
//!
//! A [`ResponseRecord`] is one row of the input table: a single respondent's chosen answer to a
//! single question, together with that respondent's demographic attributes.  The set of
//! demographic attributes is fixed at compile time and enumerated by [`Demographic`].

use std::fmt;

/// Label used for demographic cells that are empty in the input.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Demographic attributes charted on every answer detail page.
///
/// The declaration order is the order in which charts appear in the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Demographic {
    EducationLevel,
    Gender,
    HispanicOrLatino,
    IncomeLevel,
    Lgbtq,
    LivingSituation,
    Occupation,
    Pet,
    PoliticalAffiliation,
    Race,
    Religion,
    School,
    State,
}

impl Demographic {
    /// Number of demographic attributes.
    pub const COUNT: usize = 13;

    /// Every attribute in report order.
    pub const ALL: [Demographic; Demographic::COUNT] = [
        Demographic::EducationLevel,
        Demographic::Gender,
        Demographic::HispanicOrLatino,
        Demographic::IncomeLevel,
        Demographic::Lgbtq,
        Demographic::LivingSituation,
        Demographic::Occupation,
        Demographic::Pet,
        Demographic::PoliticalAffiliation,
        Demographic::Race,
        Demographic::Religion,
        Demographic::School,
        Demographic::State,
    ];

    /// Column name used in the CSV header.
    pub fn column(self) -> &'static str {
        match self {
            Demographic::EducationLevel => "educationLevel",
            Demographic::Gender => "gender",
            Demographic::HispanicOrLatino => "hispanicOrLatino",
            Demographic::IncomeLevel => "incomeLevel",
            Demographic::Lgbtq => "lgbtq",
            Demographic::LivingSituation => "livingSituation",
            Demographic::Occupation => "occupation",
            Demographic::Pet => "pet",
            Demographic::PoliticalAffiliation => "politicalAffiliation",
            Demographic::Race => "race",
            Demographic::Religion => "religion",
            Demographic::School => "school",
            Demographic::State => "state",
        }
    }

    /// Heading printed above the attribute's chart.
    pub fn label(self) -> &'static str {
        match self {
            Demographic::EducationLevel => "Education Level",
            Demographic::Gender => "Gender",
            Demographic::HispanicOrLatino => "Hispanic or Latino",
            Demographic::IncomeLevel => "Income Level",
            Demographic::Lgbtq => "LGBTQ",
            Demographic::LivingSituation => "Living Situation",
            Demographic::Occupation => "Occupation",
            Demographic::Pet => "Pet",
            Demographic::PoliticalAffiliation => "Political Affiliation",
            Demographic::Race => "Race",
            Demographic::Religion => "Religion",
            Demographic::School => "School",
            Demographic::State => "State",
        }
    }

    /// Looks up an attribute by its CSV column name.
    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|demographic| demographic.column() == column)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Demographic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One respondent's answer to one question.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseRecord {
    question: String,
    answer: String,
    demographics: [Option<String>; Demographic::COUNT],
}

impl ResponseRecord {
    /// Creates a record with no demographic values set.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            ..Self::default()
        }
    }

    /// Returns the question text.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Returns the chosen answer.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Returns the raw value for `demographic`, or `None` when the cell was empty or absent.
    pub fn demographic(&self, demographic: Demographic) -> Option<&str> {
        self.demographics[demographic.index()].as_deref()
    }

    /// Returns the value for `demographic`, mapping missing values to [`UNKNOWN_CATEGORY`].
    pub fn category(&self, demographic: Demographic) -> &str {
        self.demographic(demographic).unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Sets a demographic value. Blank strings are stored as missing.
    pub fn set_demographic(&mut self, demographic: Demographic, value: Option<String>) {
        self.demographics[demographic.index()] = value.filter(|value| !value.trim().is_empty());
    }

    /// Sets a demographic value and returns the updated record.
    pub fn with_demographic(mut self, demographic: Demographic, value: impl Into<String>) -> Self {
        self.set_demographic(demographic, Some(value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Demographic, ResponseRecord, UNKNOWN_CATEGORY};

    #[test]
    fn columns_round_trip_through_lookup() {
        for demographic in Demographic::ALL {
            assert_eq!(Demographic::from_column(demographic.column()), Some(demographic));
        }
        assert_eq!(Demographic::from_column("favouriteColor"), None);
    }

    #[test]
    fn blank_values_become_unknown() {
        let record = ResponseRecord::new("Q1", "A")
            .with_demographic(Demographic::Gender, "  ")
            .with_demographic(Demographic::Race, "Asian");

        assert_eq!(record.demographic(Demographic::Gender), None);
        assert_eq!(record.category(Demographic::Gender), UNKNOWN_CATEGORY);
        assert_eq!(record.category(Demographic::Race), "Asian");
        assert_eq!(record.category(Demographic::State), UNKNOWN_CATEGORY);
    }
}
