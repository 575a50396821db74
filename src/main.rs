mod report;
mod suite;

use anyhow::Context;
use booker::{ApiClient, Configuration, BASE_URL_KEY};
use chrono::Local;
use clap::Parser;
use report::Report;
use std::{path::PathBuf, process::ExitCode};

#[derive(Parser, Debug)]
#[clap(name = "booker-runner", version, about = "Runs the booking API suite and writes a report")]
struct CliArgs {
    /// Properties file with the service URL and credentials.
    #[clap(long, default_value = "config/config.properties")]
    pub config: PathBuf,

    /// Case table (JSON) to run after the lifecycle checks.
    pub suite: Option<PathBuf>,

    /// Overrides `base.url` from the properties file.
    #[clap(long)]
    pub base_url: Option<String>,

    /// Reports are written to a timestamped directory below this one.
    #[clap(long, default_value = "reports")]
    pub report_dir: PathBuf,

    /// Worker threads for the case table.
    #[clap(long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Log filter used when RUST_LOG is not set.
    #[clap(long)]
    pub log_filter: Option<String>,
}

fn main() -> ExitCode {
    let cli_args = CliArgs::parse();
    booker::init_logging(cli_args.log_filter.as_deref());

    match run(&cli_args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = ?e, "Suite aborted");
            ExitCode::from(2)
        }
    }
}

fn run(cli_args: &CliArgs) -> anyhow::Result<bool> {
    let started_at = Local::now();

    let mut configuration = Configuration::load(&cli_args.config)
        .with_context(|| format!("loading {}", cli_args.config.display()))?;
    if let Some(base_url) = &cli_args.base_url {
        configuration.set(BASE_URL_KEY, base_url.as_str());
    }
    let client = ApiClient::new(configuration)?;

    let mut outcomes = suite::smoke(&client);
    if let Some(suite_file) = &cli_args.suite {
        outcomes.extend(suite::run_cases(
            &client,
            suite_file,
            usize::from(cli_args.threads),
        )?);
    }

    let report = Report::new(started_at, outcomes);
    let directory = report.write(&cli_args.report_dir)?;

    tracing::info!(
        total = report.outcomes().len(),
        failed = report.failed_count(),
        report = %directory.display(),
        "Suite finished"
    );

    Ok(report.passed())
}
