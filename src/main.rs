use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use anthropometry::export::{self, json, text, ExportFormat};
use anthropometry::logging::{init_logging, LogFormat};
use anthropometry::error::ErrorSeverity;
use anthropometry::{
    AnthropometryError, AssessmentEngine, AssessmentResult, BatchRunner, EngineConfig, Evaluation, MetricName,
    MetricThresholds, RecommendationOutcome, Status,
};

/// Anthropometric assessment CLI
///
/// Computes body indices from circumference and skinfold measurements,
/// classifies each against reference bands and resolves goal-specific
/// nutrition and training guidance.
#[derive(Parser)]
#[command(name = "anthropometry")]
#[command(version)]
#[command(about = "Anthropometric assessment engine", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a single measurement record
    Evaluate {
        /// JSON file with one measurement record, or "-" for stdin
        #[arg(short, long)]
        input: String,

        /// Attach the recommendation bundle for this goal
        #[arg(short, long)]
        goal: Option<String>,

        #[arg(short = 'f', long, value_enum, default_value_t = ReportFormat::Table)]
        format: ReportFormat,
    },

    /// Assess every record of a CSV or JSON file
    Batch {
        /// Input file (.csv or .json)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (defaults to the output file extension)
        #[arg(short = 'f', long, value_enum)]
        format: Option<BatchFormat>,
    },

    /// Show the guidance bundle for a goal
    Recommend {
        /// Goal identifier, e.g. "Hipertrofia"
        #[arg(short, long)]
        goal: String,

        #[arg(short = 'f', long, value_enum, default_value_t = TableOrJson::Table)]
        format: TableOrJson,
    },

    /// Print the active threshold tables
    Thresholds {
        #[arg(short = 'f', long, value_enum, default_value_t = ThresholdFormat::Table)]
        format: ThresholdFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Table,
    Json,
    Text,
}

#[derive(Clone, Copy, ValueEnum)]
enum BatchFormat {
    Csv,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum TableOrJson {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThresholdFormat {
    Table,
    Json,
    Toml,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Category")]
    category: String,
}

#[derive(Tabled)]
struct BandRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Gender")]
    gender: &'static str,
    #[tabled(rename = "Optimal")]
    optimal: String,
    #[tabled(rename = "Warning")]
    warning: String,
}

#[derive(Tabled)]
struct GuidanceRow {
    #[tabled(rename = "Area")]
    area: &'static str,
    #[tabled(rename = "Guidance")]
    guidance: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        if let Some(domain) = err.downcast_ref::<AnthropometryError>() {
            let message = domain.user_message();
            match domain.severity() {
                ErrorSeverity::Critical | ErrorSeverity::Error => eprintln!("{}", message.red().bold()),
                ErrorSeverity::Warning | ErrorSeverity::Info => eprintln!("{}", message.yellow()),
            }
        }
        return Err(err);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::load_or_default(),
    };

    let log_config = config.logging.clone().with_overrides(cli.verbose, cli.log_format);
    init_logging(&log_config)?;

    let engine = AssessmentEngine::from_config(&config).context("Invalid threshold configuration")?;

    match cli.command {
        Commands::Evaluate { input, goal, format } => {
            run_evaluate(&engine, &input, goal.as_deref(), format)?;
        }
        Commands::Batch { input, output, format } => {
            run_batch(&engine, &config, &input, &output, format)?;
        }
        Commands::Recommend { goal, format } => {
            run_recommend(&engine, &goal, format)?;
        }
        Commands::Thresholds { format } => {
            run_thresholds(&engine, format)?;
        }
    }

    Ok(())
}

fn read_single_record(input: &str) -> Result<anthropometry::RawMeasurement> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read measurement from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))?
    };

    let mut records = json::read_measurements(content.as_bytes())
        .with_context(|| format!("Invalid measurement document in {}", input))?;

    match records.len() {
        1 => Ok(records.remove(0)),
        0 => bail!("No measurement record in {}", input),
        n => bail!("{} records in {}; use the batch command for multiple records", n, input),
    }
}

fn run_evaluate(engine: &AssessmentEngine, input: &str, goal: Option<&str>, format: ReportFormat) -> Result<()> {
    let raw = read_single_record(input)?;
    let evaluation = engine.assess(&raw, goal);

    match format {
        ReportFormat::Json => json::write_json(&evaluation, std::io::stdout().lock())?,
        ReportFormat::Text => match &evaluation {
            Evaluation::Assessed(result) => text::write_report(result, std::io::stdout().lock())?,
            Evaluation::Rejected(_) => print_rejection(&evaluation),
        },
        ReportFormat::Table => match &evaluation {
            Evaluation::Assessed(result) => print_assessment_table(result),
            Evaluation::Rejected(_) => print_rejection(&evaluation),
        },
    }

    Ok(())
}

fn status_colored(status: Status) -> ColoredString {
    match status {
        Status::Optimal => status.as_str().green(),
        Status::Warning => status.as_str().yellow(),
        Status::Alert => status.as_str().red().bold(),
        Status::Neutral => status.as_str().dimmed(),
    }
}

fn print_rejection(evaluation: &Evaluation) {
    println!("{}", "✗ Measurement rejected".red().bold());
    if let Some(errors) = evaluation.errors() {
        for (field, message) in errors {
            println!("  {} {}", format!("{}:", field).yellow(), message);
        }
    }
}

fn print_assessment_table(result: &AssessmentResult) {
    println!("{}", format!("Assessment ({})", result.gender).cyan().bold());

    let rows: Vec<MetricRow> = MetricName::ALL
        .iter()
        .filter_map(|metric| {
            let value = result.metrics.get(*metric)?;
            Some(MetricRow {
                metric: metric.label(),
                value: value.to_string(),
                status: result
                    .classifications
                    .get(metric)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                category: result.categories.get(metric).cloned().unwrap_or_default(),
            })
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));

    let alerts: Vec<_> = result
        .classifications
        .iter()
        .filter(|(_, status)| matches!(status, Status::Alert | Status::Warning))
        .collect();
    for (metric, status) in alerts {
        println!("  {} {}", status_colored(*status), metric.label());
    }

    for omitted in &result.omitted {
        println!("  {} {}", "–".dimmed(), omitted.reason.dimmed());
    }

    for message in result.warnings.values() {
        println!("  {} {}", "⚠".yellow(), message.yellow());
    }

    if let Some(suggestion) = &result.suggested_goal {
        println!();
        println!(
            "{} {} ({})",
            "Suggested goal:".bold(),
            suggestion.primary_goal.as_str().green(),
            suggestion.caloric
        );
    }

    if let Some(outcome) = &result.recommendation {
        println!();
        print_outcome_table(outcome);
    }
}

fn print_outcome_table(outcome: &RecommendationOutcome) {
    let rec = match outcome {
        RecommendationOutcome::Found(rec) => rec,
        RecommendationOutcome::Unavailable(err) => {
            println!("{}", err.to_string().yellow());
            return;
        }
    };

    println!("{}", rec.primary_goal.as_str().cyan().bold());
    println!("{}", rec.description);
    println!("{} {}", "Caloric target:".bold(), rec.caloric);
    println!("{} {}", "Training focus:".bold(), rec.training_focus);

    let rows: Vec<GuidanceRow> = [
        ("Nutrition", &rec.nutrition),
        ("Training", &rec.training),
        ("Supplements", &rec.supplements),
    ]
    .into_iter()
    .flat_map(|(area, items)| {
        items.iter().map(move |item| GuidanceRow {
            area,
            guidance: item.clone(),
        })
    })
    .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn run_recommend(engine: &AssessmentEngine, goal: &str, format: TableOrJson) -> Result<()> {
    let outcome = engine.recommend(goal);
    match format {
        TableOrJson::Json => json::write_json(&outcome, std::io::stdout().lock())?,
        TableOrJson::Table => print_outcome_table(&outcome),
    }
    Ok(())
}

fn run_batch(
    engine: &AssessmentEngine,
    config: &EngineConfig,
    input: &Path,
    output: &Path,
    format: Option<BatchFormat>,
) -> Result<()> {
    let records = export::read_measurements(input)
        .with_context(|| format!("Failed to read measurements from {}", input.display()))?;

    let format = match format {
        Some(BatchFormat::Csv) => ExportFormat::Csv,
        Some(BatchFormat::Json) => ExportFormat::Json,
        None => ExportFormat::from_path(output)
            .with_context(|| format!("Cannot infer output format from {}", output.display()))?,
    };

    let runner = BatchRunner::new(engine, config.batch.clone());
    let (evaluations, summary) = runner.run(&records)?;

    export::export_evaluations(&evaluations, format, output)
        .with_context(|| format!("Failed to write results to {}", output.display()))?;

    println!("{}", summary.to_string_pretty());
    if summary.is_fully_successful() {
        println!("{}", format!("✓ Results written to {}", output.display()).green());
    } else {
        println!(
            "{}",
            format!(
                "⚠ {} record(s) rejected; see the errors column in {}",
                summary.rejected,
                output.display()
            )
            .yellow()
        );
    }

    Ok(())
}

fn run_thresholds(engine: &AssessmentEngine, format: ThresholdFormat) -> Result<()> {
    let tables = engine.thresholds();

    match format {
        ThresholdFormat::Json => json::write_json(tables, std::io::stdout().lock())?,
        ThresholdFormat::Toml => {
            let content = toml::to_string_pretty(tables).context("Failed to render thresholds as TOML")?;
            print!("{}", content);
        }
        ThresholdFormat::Table => {
            let mut rows = Vec::new();
            for (metric, thresholds) in tables.iter() {
                let per_gender: Vec<(&'static str, _)> = match thresholds {
                    MetricThresholds::Shared(bands) => vec![("all", bands)],
                    MetricThresholds::ByGender { male, female } => vec![("M", male), ("F", female)],
                };
                for (gender, bands) in per_gender {
                    rows.push(BandRow {
                        metric: metric.label(),
                        gender,
                        optimal: bands.optimal.to_string(),
                        warning: bands.warning.to_string(),
                    });
                }
            }
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
    }

    Ok(())
}
