//! Synthetic survey responses for testing and demos.
//!
//! A [`SurveyDefinition`] names the questions and the relative weight of each answer. Every
//! generated respondent draws one value per demographic attribute from a built-in weighted
//! distribution and then answers every question, producing one [`ResponseRecord`] per question.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

use log::info;
use rand::distributions::{Distribution as _, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::dataset::write_records;
use crate::error::{ReportError, ReportResult};
use crate::model::{Demographic, ResponseRecord};

/// Questions and their weighted answer choices.
///
/// Serialized as
/// `{"questions": [...], "answer_probabilities": {"<question>": {"<answer>": <weight>}}}`.
/// Weights are relative and need not sum to one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyDefinition {
    /// Questions in the order they are asked.
    pub questions: Vec<String>,
    /// Answer weights per question.
    pub answer_probabilities: BTreeMap<String, BTreeMap<String, f64>>,
}

impl SurveyDefinition {
    /// Parses a definition from JSON.
    pub fn from_reader<R: Read>(reader: R) -> ReportResult<Self> {
        let definition: Self = serde_json::from_reader(reader)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Loads a definition from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ReportResult<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Adds a question with its answer weights and returns the updated definition.
    pub fn with_question<I, S>(mut self, question: impl Into<String>, answers: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let question = question.into();
        let answers = answers
            .into_iter()
            .map(|(answer, weight)| (answer.into(), weight))
            .collect();
        self.answer_probabilities.insert(question.clone(), answers);
        self.questions.push(question);
        self
    }

    /// Checks that every question has at least one answer and usable weights.
    pub fn validate(&self) -> ReportResult<()> {
        if self.questions.is_empty() {
            return Err(ReportError::InvalidDefinition(
                "no questions defined".to_string(),
            ));
        }
        for question in &self.questions {
            let answers = self.answer_probabilities.get(question).ok_or_else(|| {
                ReportError::InvalidDefinition(format!(
                    "no answer probabilities provided for the question: {question}"
                ))
            })?;
            if answers.is_empty() {
                return Err(ReportError::InvalidDefinition(format!(
                    "question has no answers: {question}"
                )));
            }
            if let Some((answer, weight)) = answers
                .iter()
                .find(|(_, weight)| !weight.is_finite() || **weight < 0.0)
            {
                return Err(ReportError::InvalidDefinition(format!(
                    "answer '{answer}' of question '{question}' has invalid weight {weight}"
                )));
            }
            if answers.values().sum::<f64>() <= 0.0 {
                return Err(ReportError::InvalidDefinition(format!(
                    "answer weights of question '{question}' sum to zero"
                )));
            }
        }
        Ok(())
    }
}

const EDUCATION_LEVEL: &[(&str, f64)] = &[
    ("High School", 0.27),
    ("Some College", 0.20),
    ("Associate Degree", 0.10),
    ("Bachelor's Degree", 0.23),
    ("Graduate Degree", 0.14),
    ("Less than High School", 0.06),
];
const GENDER: &[(&str, f64)] = &[("Male", 0.49), ("Female", 0.51)];
const HISPANIC_OR_LATINO: &[(&str, f64)] = &[("Yes", 0.19), ("No", 0.81)];
const INCOME_LEVEL: &[(&str, f64)] = &[
    ("Under $25k", 0.17),
    ("$25k-$50k", 0.20),
    ("$50k-$100k", 0.29),
    ("$100k-$200k", 0.23),
    ("Over $200k", 0.11),
];
const LGBTQ: &[(&str, f64)] = &[("Yes", 0.07), ("No", 0.93)];
const LIVING_SITUATION: &[(&str, f64)] = &[
    ("Own Home", 0.65),
    ("Rent", 0.31),
    ("Live with Family", 0.04),
];
const OCCUPATION: &[(&str, f64)] = &[
    ("Employed Full-Time", 0.48),
    ("Employed Part-Time", 0.12),
    ("Self-Employed", 0.07),
    ("Student", 0.08),
    ("Retired", 0.18),
    ("Unemployed", 0.07),
];
const PET: &[(&str, f64)] = &[
    ("Dog", 0.38),
    ("Cat", 0.25),
    ("Other", 0.07),
    ("None", 0.30),
];
const POLITICAL_AFFILIATION: &[(&str, f64)] = &[
    ("Democrat", 0.31),
    ("Republican", 0.30),
    ("Independent", 0.35),
    ("Other", 0.04),
];
const RACE: &[(&str, f64)] = &[
    ("White", 0.578),
    ("Black or African American", 0.124),
    ("Asian", 0.059),
    ("American Indian", 0.007),
    ("Native Hawaiian or Other Pacific Islander", 0.002),
    ("Other", 0.03),
];
const RELIGION: &[(&str, f64)] = &[
    ("Christianity", 0.65),
    ("Judaism", 0.02),
    ("Islam", 0.01),
    ("Buddhism", 0.01),
    ("Hinduism", 0.01),
    ("Not Religious", 0.26),
    ("Other", 0.04),
];
const SCHOOL: &[(&str, f64)] = &[
    ("Public", 0.82),
    ("Private", 0.10),
    ("Charter", 0.05),
    ("Homeschool", 0.03),
];
const STATE: &[(&str, f64)] = &[
    ("California", 0.118),
    ("Texas", 0.090),
    ("Florida", 0.067),
    ("New York", 0.059),
    ("Pennsylvania", 0.039),
    ("Illinois", 0.038),
    ("Ohio", 0.035),
    ("Georgia", 0.033),
    ("Other", 0.521),
];

/// Built-in weighted categories for `demographic`.
pub fn demographic_weights(demographic: Demographic) -> &'static [(&'static str, f64)] {
    match demographic {
        Demographic::EducationLevel => EDUCATION_LEVEL,
        Demographic::Gender => GENDER,
        Demographic::HispanicOrLatino => HISPANIC_OR_LATINO,
        Demographic::IncomeLevel => INCOME_LEVEL,
        Demographic::Lgbtq => LGBTQ,
        Demographic::LivingSituation => LIVING_SITUATION,
        Demographic::Occupation => OCCUPATION,
        Demographic::Pet => PET,
        Demographic::PoliticalAffiliation => POLITICAL_AFFILIATION,
        Demographic::Race => RACE,
        Demographic::Religion => RELIGION,
        Demographic::School => SCHOOL,
        Demographic::State => STATE,
    }
}

/// Weighted categorical sampler over string labels.
struct CategoricalSampler<'a> {
    labels: Vec<&'a str>,
    index: WeightedIndex<f64>,
}

impl<'a> CategoricalSampler<'a> {
    fn new<I>(choices: I, context: &str) -> ReportResult<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let (labels, weights): (Vec<&str>, Vec<f64>) = choices.into_iter().unzip();
        let index = WeightedIndex::new(weights).map_err(|err| {
            ReportError::InvalidDefinition(format!("cannot sample {context}: {err}"))
        })?;
        Ok(Self { labels, index })
    }

    fn sample(&self, rng: &mut StdRng) -> &'a str {
        self.labels[self.index.sample(rng)]
    }
}

/// Generates `samples` respondents answering every question of `definition`.
///
/// The same seed always yields the same records.
pub fn generate(
    definition: &SurveyDefinition,
    samples: usize,
    seed: u64,
) -> ReportResult<Vec<ResponseRecord>> {
    definition.validate()?;

    let demographic_samplers = Demographic::ALL
        .iter()
        .map(|&demographic| {
            CategoricalSampler::new(
                demographic_weights(demographic).iter().copied(),
                demographic.column(),
            )
            .map(|sampler| (demographic, sampler))
        })
        .collect::<ReportResult<Vec<_>>>()?;

    let question_samplers = definition
        .questions
        .iter()
        .map(|question| {
            let answers = &definition.answer_probabilities[question];
            CategoricalSampler::new(
                answers.iter().map(|(answer, &weight)| (answer.as_str(), weight)),
                question,
            )
            .map(|sampler| (question.as_str(), sampler))
        })
        .collect::<ReportResult<Vec<_>>>()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(samples * question_samplers.len());

    for _ in 0..samples {
        let profile: Vec<(Demographic, &str)> = demographic_samplers
            .iter()
            .map(|(demographic, sampler)| (*demographic, sampler.sample(&mut rng)))
            .collect();

        for (question, sampler) in &question_samplers {
            let mut record = ResponseRecord::new(*question, sampler.sample(&mut rng));
            for &(demographic, value) in &profile {
                record = record.with_demographic(demographic, value);
            }
            records.push(record);
        }
    }

    info!(
        "Generated {} records for {} respondents",
        records.len(),
        samples
    );
    Ok(records)
}

/// Writes generated records to a CSV file readable by [`crate::dataset::load_table`].
pub fn write_dataset(path: impl AsRef<Path>, records: &[ResponseRecord]) -> ReportResult<()> {
    let file = File::create(path.as_ref())?;
    write_records(BufWriter::new(file), records)?;
    info!("Wrote {} records to {}", records.len(), path.as_ref().display());
    Ok(())
}
