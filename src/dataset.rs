//! CSV loading and writing for response tables.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::error::{ReportError, ReportResult};
use crate::model::{Demographic, ResponseRecord};

/// Header of the column holding the question text.
pub const QUESTION_COLUMN: &str = "question";
/// Header of the column holding the chosen answer.
pub const ANSWER_COLUMN: &str = "answer";

/// Response records together with the demographic columns that were present in the input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurveyTable {
    records: Vec<ResponseRecord>,
    demographics: Vec<Demographic>,
}

impl SurveyTable {
    /// Creates a table from records whose demographic columns are all considered present.
    pub fn new(records: Vec<ResponseRecord>) -> Self {
        Self {
            records,
            demographics: Demographic::ALL.to_vec(),
        }
    }

    /// Restricts the table to the given demographic columns, kept in report order.
    pub fn with_demographics(
        mut self,
        demographics: impl IntoIterator<Item = Demographic>,
    ) -> Self {
        let mut demographics: Vec<_> = demographics.into_iter().collect();
        demographics.sort();
        demographics.dedup();
        self.demographics = demographics;
        self
    }

    /// Returns the response records in input order.
    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    /// Returns the demographic columns available for charting, in report order.
    pub fn demographics(&self) -> &[Demographic] {
        &self.demographics
    }

    /// Returns `true` when the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads a response table from CSV data with a header row.
///
/// `question` and `answer` must be present. Each demographic column is optional: when one is
/// absent its chart is skipped and a warning is logged. Empty demographic cells are kept as
/// missing values.
pub fn read_table<R: Read>(reader: R) -> ReportResult<SurveyTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |column: &str| headers.iter().position(|header| header == column);

    let question_index = position(QUESTION_COLUMN).ok_or_else(|| ReportError::MissingColumn {
        column: QUESTION_COLUMN.to_string(),
    })?;
    let answer_index = position(ANSWER_COLUMN).ok_or_else(|| ReportError::MissingColumn {
        column: ANSWER_COLUMN.to_string(),
    })?;

    let mut columns = Vec::new();
    for demographic in Demographic::ALL {
        match position(demographic.column()) {
            Some(index) => columns.push((demographic, index)),
            None => warn!(
                "Column `{}` not found; the {} chart will be skipped",
                demographic.column(),
                demographic.label()
            ),
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|pos| pos.line()).unwrap_or_default();
        let field = |index: usize| row.get(index).unwrap_or_default();

        let question = field(question_index);
        let answer = field(answer_index);
        if question.is_empty() {
            return Err(ReportError::InvalidRecord {
                line,
                reason: "question is empty".to_string(),
            });
        }
        if answer.is_empty() {
            return Err(ReportError::InvalidRecord {
                line,
                reason: "answer is empty".to_string(),
            });
        }

        let mut record = ResponseRecord::new(question, answer);
        for &(demographic, index) in &columns {
            record.set_demographic(demographic, Some(field(index).to_string()));
        }
        records.push(record);
    }

    debug!(
        "Read {} records with {} demographic columns",
        records.len(),
        columns.len()
    );

    Ok(SurveyTable::new(records).with_demographics(columns.into_iter().map(|(d, _)| d)))
}

/// Loads a response table from the CSV file at `path`.
pub fn load_table(path: impl AsRef<Path>) -> ReportResult<SurveyTable> {
    let path = path.as_ref();
    let table = read_table(File::open(path)?)?;
    info!("Loaded {} records from {}", table.records().len(), path.display());
    Ok(table)
}

/// Writes records as CSV with the full column layout understood by [`read_table`].
pub fn write_records<W: Write>(writer: W, records: &[ResponseRecord]) -> ReportResult<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![QUESTION_COLUMN, ANSWER_COLUMN];
    header.extend(Demographic::ALL.iter().map(|demographic| demographic.column()));
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![record.question(), record.answer()];
        row.extend(
            Demographic::ALL
                .iter()
                .map(|&demographic| record.demographic(demographic).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_required_and_optional_columns() {
        let data = "question,answer,gender,race\n\
                    Q1,A,Male,White\n\
                    Q1,B,,Asian\n";
        let table = read_table(data.as_bytes()).expect("table parses");

        assert_eq!(table.records().len(), 2);
        assert_eq!(table.demographics(), &[Demographic::Gender, Demographic::Race]);
        assert_eq!(table.records()[1].answer(), "B");
        assert_eq!(table.records()[1].demographic(Demographic::Gender), None);
        assert_eq!(table.records()[1].demographic(Demographic::Race), Some("Asian"));
    }

    #[test]
    fn missing_answer_column_fails_fast() {
        let err = read_table("question,gender\nQ1,Male\n".as_bytes()).unwrap_err();
        match err {
            ReportError::MissingColumn { column } => assert_eq!(column, ANSWER_COLUMN),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_question_is_rejected_with_line_number() {
        let err = read_table("question,answer\nQ1,A\n,B\n".as_bytes()).unwrap_err();
        match err {
            ReportError::InvalidRecord { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("question"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn written_records_read_back_with_all_columns() {
        let records = vec![
            ResponseRecord::new("Do you vote?", "Yes, always")
                .with_demographic(Demographic::Gender, "Female")
                .with_demographic(Demographic::State, "Ohio"),
        ];
        let mut buffer = Vec::new();
        write_records(&mut buffer, &records).expect("records write");

        let table = read_table(buffer.as_slice()).expect("table parses");
        assert_eq!(table.demographics(), &Demographic::ALL);
        assert_eq!(table.records(), records.as_slice());
    }
}
