use std::error::Error;

use survey_report::{aggregate, synth, ReportBuilder, ReportConfig, SurveyDefinition, SurveyTable};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let definition = SurveyDefinition::default()
        .with_question(
            "How satisfied are you with public transit in your area?",
            [
                ("Very satisfied", 0.15),
                ("Somewhat satisfied", 0.35),
                ("Somewhat dissatisfied", 0.30),
                ("Very dissatisfied", 0.20),
            ],
        )
        .with_question(
            "Would you support a new bike lane on Main Street?",
            [("Yes", 0.55), ("No", 0.35), ("Not sure", 0.10)],
        );

    let records = synth::generate(&definition, 500, 2024)?;
    synth::write_dataset("sample_survey.csv", &records)?;

    let aggregation = aggregate(&SurveyTable::new(records));
    let report = ReportBuilder::new(ReportConfig::new())
        .with_title("Sample Community Survey")
        .write_pdf(&aggregation, "sample_report.pdf")?;
    println!(
        "Generated sample_report.pdf ({} pages, {} bytes)",
        report.pages,
        report.bytes.len()
    );
    Ok(())
}
