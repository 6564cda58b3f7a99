// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use std::process::ExitCode;

use url_trust_scanner::app::App;
use url_trust_scanner::cli::Cli;
use url_trust_scanner::config;
use url_trust_scanner::core::error::AnalysisError;
use url_trust_scanner::logging;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // --- Setup ---
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::initialize_logging(cli.verbose)?;

    let settings = match &cli.config {
        Some(path) => config::load_from(path)?,
        None => config::load_or_init()?,
    };
    tracing::debug!(?settings, "Starting {}.", env!("CARGO_PKG_NAME"));

    let app = App::new(settings);
    match app.run(cli.command).await {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(report) => {
            // Invalid input exits with status 2.
            if let Some(err @ AnalysisError::InvalidUrl { .. }) = report.downcast_ref::<AnalysisError>() {
                eprintln!("error: {err}");
                return Ok(ExitCode::from(2));
            }
            tracing::error!(error = ?report, "Command failed.");
            eprintln!("Error: {report:?}");
            Ok(ExitCode::FAILURE)
        }
    }
}
