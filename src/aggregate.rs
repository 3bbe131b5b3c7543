//! Grouping of response records and per-group value counts.
//!
//! [`aggregate`] turns a flat [`SurveyTable`] into one [`QuestionSummary`] per distinct question.
//! Each summary carries the answer totals for the question's bar chart and one [`AnswerGroup`] per
//! distinct answer, holding a [`Distribution`] for every demographic column in the table.
//!
//! Questions and answers are ordered by the row index at which they first appear in the input.
//! That index is stored as an explicit sort key so the output never depends on map iteration
//! order.

use std::collections::BTreeMap;

use log::debug;

use crate::dataset::SurveyTable;
use crate::model::Demographic;

/// Category counts for one attribute, with derived percentages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Distribution {
    counts: BTreeMap<String, u64>,
}

/// A category of a [`Distribution`] at its rank position.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedEntry {
    /// Zero-based rank; `0` is the leading category.
    pub rank: usize,
    /// Category label.
    pub label: String,
    /// Raw count.
    pub count: u64,
    /// Share of the distribution total in percent, `0.0` for an empty distribution.
    pub percentage: f64,
}

impl Distribution {
    /// Creates an empty distribution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every value yielded by `values`.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distribution = Self::new();
        for value in values {
            distribution.increment(value.as_ref());
        }
        distribution
    }

    /// Adds one to the count of `category`.
    pub fn increment(&mut self, category: &str) {
        self.add(category, 1);
    }

    /// Adds `count` to the count of `category`.
    pub fn add(&mut self, category: &str, count: u64) {
        match self.counts.get_mut(category) {
            Some(existing) => *existing += count,
            None => {
                self.counts.insert(category.to_string(), count);
            }
        }
    }

    /// Returns the count for `category`, or zero if it never occurred.
    pub fn count(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Returns the sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` when no category has been counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Percentage of the total held by `category`; `0.0` when the total is zero.
    pub fn percentage(&self, category: &str) -> f64 {
        percentage_of(self.count(category), self.total())
    }

    /// Returns the categories sorted by descending count, ties broken by ascending label.
    pub fn ranked(&self) -> Vec<RankedEntry> {
        let total = self.total();
        let mut entries: Vec<(&String, u64)> =
            self.counts.iter().map(|(label, &count)| (label, count)).collect();
        // The map already yields labels in ascending order; a stable sort keeps it for ties.
        entries.sort_by(|a, b| b.1.cmp(&a.1));

        entries
            .into_iter()
            .enumerate()
            .map(|(rank, (label, count))| RankedEntry {
                rank,
                label: label.clone(),
                count,
                percentage: percentage_of(count, total),
            })
            .collect()
    }

    /// Returns the leading category: highest count, lowest label among ties.
    pub fn leading(&self) -> Option<RankedEntry> {
        self.ranked().into_iter().next()
    }
}

fn percentage_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// All records that chose one answer to one question.
#[derive(Clone, Debug, PartialEq)]
pub struct AnswerGroup {
    answer: String,
    size: u64,
    distributions: Vec<(Demographic, Distribution)>,
}

impl AnswerGroup {
    /// Returns the answer shared by the group.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Number of records in the group.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Per-attribute distributions in report order.
    pub fn distributions(&self) -> &[(Demographic, Distribution)] {
        &self.distributions
    }

    /// Returns the distribution for `demographic`, if that column was present.
    pub fn distribution(&self, demographic: Demographic) -> Option<&Distribution> {
        self.distributions
            .iter()
            .find(|(candidate, _)| *candidate == demographic)
            .map(|(_, distribution)| distribution)
    }
}

/// Answer totals and answer groups of one question.
#[derive(Clone, Debug, PartialEq)]
pub struct QuestionSummary {
    question: String,
    answer_totals: Distribution,
    answers: Vec<AnswerGroup>,
}

impl QuestionSummary {
    /// Returns the question text.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Returns answer → count over every record for this question.
    pub fn answer_totals(&self) -> &Distribution {
        &self.answer_totals
    }

    /// Returns the answer groups in first-seen order.
    pub fn answers(&self) -> &[AnswerGroup] {
        &self.answers
    }

    /// Total number of records for this question.
    pub fn respondents(&self) -> u64 {
        self.answer_totals.total()
    }
}

/// Result of [`aggregate`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregation {
    questions: Vec<QuestionSummary>,
    demographics: Vec<Demographic>,
}

impl Aggregation {
    /// Returns the question summaries in first-seen order.
    pub fn questions(&self) -> &[QuestionSummary] {
        &self.questions
    }

    /// Returns the demographic attributes that were aggregated.
    pub fn demographics(&self) -> &[Demographic] {
        &self.demographics
    }

    /// Iterates over every (question, group) pair in report order.
    pub fn groups(&self) -> impl Iterator<Item = (&QuestionSummary, &AnswerGroup)> + '_ {
        self.questions
            .iter()
            .flat_map(|question| question.answers.iter().map(move |group| (question, group)))
    }

    /// Returns `true` when there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

struct GroupAccumulator {
    first_seen: usize,
    size: u64,
    distributions: Vec<Distribution>,
}

struct QuestionAccumulator {
    first_seen: usize,
    answers: BTreeMap<String, GroupAccumulator>,
}

/// Groups the table by (question, answer) and counts demographic values within each group.
///
/// Missing demographic values are counted under [`crate::model::UNKNOWN_CATEGORY`], so every
/// distribution of a group sums to the group size.
pub fn aggregate(table: &SurveyTable) -> Aggregation {
    let demographics = table.demographics().to_vec();
    let mut questions: BTreeMap<String, QuestionAccumulator> = BTreeMap::new();

    for (row, record) in table.records().iter().enumerate() {
        let question = questions
            .entry(record.question().to_string())
            .or_insert_with(|| QuestionAccumulator {
                first_seen: row,
                answers: BTreeMap::new(),
            });
        let group = question
            .answers
            .entry(record.answer().to_string())
            .or_insert_with(|| GroupAccumulator {
                first_seen: row,
                size: 0,
                distributions: vec![Distribution::new(); demographics.len()],
            });

        group.size += 1;
        for (distribution, &demographic) in group.distributions.iter_mut().zip(&demographics) {
            distribution.increment(record.category(demographic));
        }
    }

    let mut ordered: Vec<(String, QuestionAccumulator)> = questions.into_iter().collect();
    ordered.sort_by_key(|(_, question)| question.first_seen);

    let questions = ordered
        .into_iter()
        .map(|(text, accumulator)| {
            let mut groups: Vec<(String, GroupAccumulator)> =
                accumulator.answers.into_iter().collect();
            groups.sort_by_key(|(_, group)| group.first_seen);

            let mut answer_totals = Distribution::new();
            let answers = groups
                .into_iter()
                .map(|(answer, group)| {
                    answer_totals.add(&answer, group.size);
                    AnswerGroup {
                        answer,
                        size: group.size,
                        distributions: demographics
                            .iter()
                            .copied()
                            .zip(group.distributions)
                            .collect(),
                    }
                })
                .collect::<Vec<_>>();

            debug!(
                "Aggregated question '{}' with {} answers",
                text,
                answers.len()
            );

            QuestionSummary {
                question: text,
                answer_totals,
                answers,
            }
        })
        .collect();

    Aggregation {
        questions,
        demographics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResponseRecord, UNKNOWN_CATEGORY};

    #[test]
    fn ranking_breaks_ties_lexically() {
        let distribution = Distribution::from_values(["Z", "Y", "X", "Y", "Z", "W"]);
        let labels: Vec<_> = distribution
            .ranked()
            .into_iter()
            .map(|entry| entry.label)
            .collect();
        assert_eq!(labels, ["Y", "Z", "W", "X"]);
        assert_eq!(distribution.leading().map(|entry| entry.label).as_deref(), Some("Y"));
    }

    #[test]
    fn empty_distribution_has_zero_percentages() {
        let mut distribution = Distribution::new();
        distribution.add("Nobody", 0);
        assert_eq!(distribution.total(), 0);
        assert_eq!(distribution.percentage("Nobody"), 0.0);
        assert!(distribution.ranked().iter().all(|entry| entry.percentage == 0.0));
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let table = SurveyTable::new(vec![
            ResponseRecord::new("Second?", "No"),
            ResponseRecord::new("First?", "Yes"),
            ResponseRecord::new("Second?", "Yes"),
            ResponseRecord::new("Second?", "No"),
        ]);
        let aggregation = aggregate(&table);

        let order: Vec<_> = aggregation
            .groups()
            .map(|(question, group)| (question.question(), group.answer()))
            .collect();
        assert_eq!(
            order,
            [("Second?", "No"), ("Second?", "Yes"), ("First?", "Yes")]
        );
        assert_eq!(aggregation.questions()[0].answer_totals().count("No"), 2);
    }

    #[test]
    fn missing_values_land_in_unknown_bucket() {
        let table = SurveyTable::new(vec![
            ResponseRecord::new("Q", "A").with_demographic(Demographic::Pet, "Dog"),
            ResponseRecord::new("Q", "A"),
        ])
        .with_demographics([Demographic::Pet]);
        let aggregation = aggregate(&table);
        let group = &aggregation.questions()[0].answers()[0];
        let pets = group.distribution(Demographic::Pet).expect("pet column aggregated");

        assert_eq!(pets.count("Dog"), 1);
        assert_eq!(pets.count(UNKNOWN_CATEGORY), 1);
        assert_eq!(pets.total(), group.size());
        assert!(group.distribution(Demographic::Gender).is_none());
    }
}
