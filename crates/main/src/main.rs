use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::LevelFilter;
use survey_report::{dataset, synth, ReportBuilder, ReportConfig, SurveyDefinition};

/// Builds survey PDF reports and synthetic survey datasets.
///
/// Fonts must be present under `assets/fonts` relative to the `survey_report` crate or provided
/// via the `SURVEY_REPORT_FONTS_DIR` environment variable before running `report`.
#[derive(Parser)]
#[command(author, version, about = "Survey PDF report generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a PDF report from a CSV file of survey responses.
    #[command(name = "report")]
    Report {
        /// CSV file with `question`, `answer` and demographic columns.
        #[arg(short, long)]
        input: PathBuf,
        /// Destination of the PDF.
        #[arg(short, long, default_value = "survey_report.pdf")]
        output: PathBuf,
        /// Logo image shown on title pages and in the page header.
        #[arg(long)]
        logo: Option<PathBuf>,
    },

    /// Generate a CSV file of synthetic responses from a JSON survey definition.
    #[command(name = "generate", aliases = ["synth"])]
    Generate {
        /// JSON file listing questions and answer probabilities.
        #[arg(short, long)]
        definition: PathBuf,
        /// Number of respondents to simulate.
        #[arg(short, long, default_value_t = 1000)]
        samples: usize,
        /// Seed of the random generator.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Destination of the CSV file.
        #[arg(short, long, default_value = "survey_data.csv")]
        output: PathBuf,
    },
}

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            input,
            output,
            logo,
        } => run_report(&input, &output, logo),
        Commands::Generate {
            definition,
            samples,
            seed,
            output,
        } => run_generate(definition, samples, seed, output),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run_report(input: &Path, output: &Path, logo: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let table = dataset::load_table(input)?;

    let config = ReportConfig::new().with_logo(logo);
    let aggregation = survey_report::aggregate(&table);
    let report = ReportBuilder::new(config).write_pdf(&aggregation, output)?;
    println!(
        "Wrote report for {} ({} pages) to {}",
        input.display(),
        report.pages,
        output.display()
    );
    Ok(())
}

fn run_generate(
    definition: PathBuf,
    samples: usize,
    seed: u64,
    output: PathBuf,
) -> Result<(), Box<dyn Error>> {
    let definition = SurveyDefinition::load(&definition)?;
    let records = synth::generate(&definition, samples, seed)?;
    synth::write_dataset(&output, &records)?;
    println!("Wrote {} records to {}", records.len(), output.display());
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
