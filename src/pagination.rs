//! Logical page sequence of the report.
//!
//! [`plan_pages`] walks the aggregated groups in report order and emits a title page whenever a
//! new question starts, followed by one detail page per answer. The plan is independent of fonts
//! and paper size: one logical page may spill over several physical pages when rendered.

use crate::aggregate::{AnswerGroup, Aggregation, QuestionSummary};

/// A logical page of the report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PagePlan<'a> {
    /// Logo, question text and the answer bar chart.
    Title {
        /// The question being introduced.
        question: &'a QuestionSummary,
    },
    /// Answer heading and one demographic chart per attribute.
    AnswerDetail {
        /// The question the answer belongs to.
        question: &'a QuestionSummary,
        /// The answer group being broken down.
        group: &'a AnswerGroup,
    },
}

impl<'a> PagePlan<'a> {
    /// Returns the question this page belongs to.
    pub fn question(&self) -> &'a QuestionSummary {
        match *self {
            PagePlan::Title { question } | PagePlan::AnswerDetail { question, .. } => question,
        }
    }
}

/// Produces the page sequence for `aggregation`.
///
/// Each question's title page is emitted exactly once, immediately before its first detail page.
pub fn plan_pages(aggregation: &Aggregation) -> Vec<PagePlan<'_>> {
    let mut pages = Vec::new();
    let mut current: Option<&str> = None;

    for (question, group) in aggregation.groups() {
        if current != Some(question.question()) {
            pages.push(PagePlan::Title { question });
            current = Some(question.question());
        }
        pages.push(PagePlan::AnswerDetail { question, group });
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::dataset::SurveyTable;
    use crate::model::ResponseRecord;

    #[test]
    fn title_precedes_each_question_once() {
        let table = SurveyTable::new(vec![
            ResponseRecord::new("Q1", "A"),
            ResponseRecord::new("Q2", "Yes"),
            ResponseRecord::new("Q1", "B"),
            ResponseRecord::new("Q2", "No"),
        ]);
        let aggregation = aggregate(&table);
        let pages = plan_pages(&aggregation);

        let shape: Vec<String> = pages
            .iter()
            .map(|page| match page {
                PagePlan::Title { question } => format!("title:{}", question.question()),
                PagePlan::AnswerDetail { question, group } => {
                    format!("{}:{}", question.question(), group.answer())
                }
            })
            .collect();
        assert_eq!(
            shape,
            ["title:Q1", "Q1:A", "Q1:B", "title:Q2", "Q2:Yes", "Q2:No"]
        );
    }

    #[test]
    fn empty_aggregation_has_no_pages() {
        let aggregation = aggregate(&SurveyTable::default());
        assert!(plan_pages(&aggregation).is_empty());
    }
}
