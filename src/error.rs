//! Error type shared by every stage of report generation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors that abort report or dataset generation.
///
/// Generation is all-or-nothing: any variant returned from the public API means no output file
/// was written.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A column the report cannot be built without is absent from the input header.
    #[error("required column `{column}` is missing from the input header")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
    },
    /// A data row could not be turned into a response record.
    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord {
        /// 1-indexed line in the input file, header included.
        line: u64,
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The input held no response records, so there is nothing to report.
    #[error("input contains no response records")]
    EmptyInput,
    /// The synthetic survey definition failed validation.
    #[error("invalid survey definition: {0}")]
    InvalidDefinition(String),
    /// No usable font family could be loaded.
    #[error("failed to load fonts: {0}")]
    FontLoad(#[source] genpdf::error::Error),
    /// The configured logo file could not be decoded.
    #[error("failed to load logo {}: {source}", path.display())]
    Logo {
        /// Path of the logo file.
        path: PathBuf,
        /// Underlying decoding error.
        #[source]
        source: genpdf::error::Error,
    },
    /// `genpdf` failed while laying out or serializing the document.
    #[error("failed to render PDF: {0}")]
    Render(#[source] genpdf::error::Error),
    /// Reading or writing CSV data failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// The survey definition was not valid JSON.
    #[error("failed to parse survey definition: {0}")]
    Definition(#[from] serde_json::Error),
    /// Reading an input file or writing the report failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}
