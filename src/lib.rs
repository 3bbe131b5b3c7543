//! Core entry point for the survey_report crate.
//!
//! Survey responses are loaded from CSV ([`dataset`]), grouped by question and answer
//! ([`aggregate`]), planned into pages ([`pagination`]), and rendered into a decorated PDF with
//! bar and pie charts ([`builder`], [`elements`]). [`synth`] produces reproducible sample data.

pub mod aggregate;
pub mod builder;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod model;
pub mod pagination;
pub mod palette;
pub mod synth;

pub use aggregate::{aggregate, Aggregation, AnswerGroup, Distribution, QuestionSummary};
pub use builder::{RenderedReport, ReportBuilder};
pub use config::ReportConfig;
pub use dataset::{load_table, read_table, SurveyTable};
pub use error::{ReportError, ReportResult};
pub use model::{Demographic, ResponseRecord};
pub use synth::{generate, SurveyDefinition};
