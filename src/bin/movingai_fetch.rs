use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use movingai_fetch::config::PipelineConfig;
use movingai_fetch::error::FetchError;
use movingai_fetch::extract::ZipExtractor;
use movingai_fetch::fetch::HttpFetcher;
use movingai_fetch::output::{JsonOutput, OutputMode, TextOutput};
use movingai_fetch::pipeline::{Pipeline, ProgressSink};

#[derive(Parser)]
#[command(name = "movingai-fetch")]
#[command(about = "Download and unpack the Moving AI grid benchmarks")]
#[command(version, author)]
struct Cli {
    /// Print the run report as JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<FetchError>() {
            if let Some(resource) = err.resource() {
                eprintln!("failed resource: {resource}");
            }
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::InvalidResourceName(_) | FetchError::InvalidBaseUrl { .. } => 2,
        err if err.is_network() => 3,
        FetchError::Extract { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let config = PipelineConfig::builtin()?;
    let fetcher = HttpFetcher::new()?;
    let pipeline = Pipeline::new(config, fetcher, ZipExtractor);

    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Text => &TextOutput,
        OutputMode::Json => &JsonOutput,
    };
    let report = pipeline.run(sink)?;

    match output_mode {
        OutputMode::Text => TextOutput::print_report(&report),
        OutputMode::Json => JsonOutput::print_report(&report).into_diagnostic()?,
    }
    Ok(())
}
