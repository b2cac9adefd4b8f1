// textlens: run Cloud Natural Language analyses on one row of a tabular file
// and print the merged result as terminal panels, JSON or an HTML page.
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use termcolor::{ColorChoice, StandardStream};
use tracing::{debug, info, warn};

mod config;
mod error;
mod loader;
mod logging;
mod nlp;
mod render;

use config::AuthOpts;
use loader::{Table, TableFormat};
use logging::LoggingOpts;
use nlp::{aggregate, AnalysisRequest, Capability, Dispatcher, HttpLanguageService};
use render::{Report, SectionFilter, SectionKind};

const CREDENTIAL_MESSAGE: &str = "API error: invalid or expired credentials. \
     Renew your API key or use a valid service-account token.";

#[derive(Parser)]
#[command(
    name = "textlens",
    version,
    about = "Sentiment, entities, categories and moderation for one row of a CSV, Excel or JSON file"
)]
struct Cli {
    #[command(flatten)]
    logging: LoggingOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the rows of the `Text` column with their indices
    Rows {
        file: PathBuf,
        #[arg(short, long)]
        format: Option<TableFormat>,
    },
    /// Analyze one row and print the results
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    file: PathBuf,

    /// Input format, inferred from the extension when omitted
    #[arg(short, long)]
    format: Option<TableFormat>,

    /// Zero-based index of the row to analyze
    #[arg(short, long, default_value_t = 0)]
    row: usize,

    /// Analyses to run, may be repeated
    #[arg(
        short,
        long = "capability",
        value_enum,
        default_values_t = [Capability::Sentiment, Capability::EntityRecognition]
    )]
    capabilities: Vec<Capability>,

    /// Sections to show, may be repeated. All sections are shown by default
    #[arg(long, value_enum)]
    show: Vec<SectionKind>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Also write the report as a standalone HTML page
    #[arg(long)]
    html: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,

    #[command(flatten)]
    auth: AuthOpts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto if std::io::stdout().is_terminal() => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

fn load_table(file: &Path, format: Option<TableFormat>) -> Result<Table> {
    let table = Table::load(file, format)
        .with_context(|| format!("failed to load {}", file.display()))?;
    eprintln!("Loaded {} records", table.len());
    if table.is_empty() {
        warn!("{} has a 'Text' column but no rows", file.display());
    }
    Ok(table)
}

fn list_rows(file: &Path, format: Option<TableFormat>) -> Result<()> {
    let table = load_table(file, format)?;
    for (index, text) in table.iter() {
        println!("{}\t{}", index, text);
    }
    Ok(())
}

fn spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    pb.set_message("Analyzing...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let table = load_table(&args.file, args.format)?;
    let text = table.text(args.row)?;
    let request = AnalysisRequest::new(text, args.capabilities.iter().copied())?;
    let config = args.auth.resolve().context("invalid client configuration")?;
    debug!("Using endpoint {}", config.endpoint);

    let dispatcher = Dispatcher::new(HttpLanguageService::new(config)?);
    let pb = spinner()?;
    let outcome = dispatcher.dispatch(&request);
    pb.finish_and_clear();

    let raw = match outcome {
        Ok(raw) => raw,
        Err(err) if err.is_credential() => {
            return Err(anyhow::Error::new(err).context(CREDENTIAL_MESSAGE));
        }
        Err(err) => return Err(err.into()),
    };

    debug!("{} capabilities answered", raw.len());
    let aggregation = aggregate(request.text(), &raw);
    let report = Report::new(&aggregation, &raw);
    let filter = SectionFilter::new(&args.show);

    match args.output {
        OutputFormat::Text => {
            println!("Text of row {}:", args.row);
            println!("{}", request.text());
            let mut stdout = StandardStream::stdout(args.color.choice());
            render::terminal::write_report(&mut stdout, &report, &filter)?;
        }
        OutputFormat::Json => {
            let value = render::json::to_json(&report, &filter)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    if let Some(path) = &args.html {
        let page = render::html::render_html(&report, &filter)?;
        fs::write(path, page)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote HTML report to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    cli.logging.init();

    match cli.command {
        Commands::Rows { file, format } => list_rows(&file, format)?,
        Commands::Analyze(args) => analyze(args)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::parse_from(["textlens", "analyze", "tweets.csv", "--api-key", "k"]);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.row, 0);
                assert_eq!(
                    args.capabilities,
                    vec![Capability::Sentiment, Capability::EntityRecognition]
                );
                assert!(args.show.is_empty());
                assert_eq!(args.output, OutputFormat::Text);
                assert_eq!(args.color, ColorMode::Auto);
            }
            _ => panic!("expected the analyze command"),
        }
    }

    #[test]
    fn test_repeated_flags() {
        let cli = Cli::parse_from([
            "textlens",
            "-vv",
            "analyze",
            "tweets.xlsx",
            "--row",
            "3",
            "-c",
            "moderation",
            "-c",
            "entity-sentiment",
            "--show",
            "entities",
            "--output",
            "json",
            "--color",
            "never",
        ]);
        assert_eq!(cli.logging.verbose, 2);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.row, 3);
                assert_eq!(
                    args.capabilities,
                    vec![Capability::Moderation, Capability::EntitySentiment]
                );
                assert_eq!(args.show, vec![SectionKind::Entities]);
                assert_eq!(args.output, OutputFormat::Json);
                assert_eq!(args.color.choice(), ColorChoice::Never);
            }
            _ => panic!("expected the analyze command"),
        }
    }
}
