mod args;
mod config;
mod render;

use std::process::ExitCode;

use clap::Parser;
use pipecost_app::{ApiError, AppState, QuerySource, Result, ScanRequest};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use args::{Cli, Commands, OutputFormat};

/// Logs go to stderr so JSON on stdout stays clean.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match config::load(cli.config.as_deref()) {
        Ok(load) => load,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    match &config.path {
        Some(path) => debug!(path = %path.display(), "loaded config"),
        None => debug!("using default config"),
    }

    let format = cli.command.format();
    let state = AppState::new(config.config);
    match run(&state, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match format {
                OutputFormat::Json => {
                    let payload = ApiError::from(err);
                    match serde_json::to_string_pretty(&payload) {
                        Ok(json) => println!("{json}"),
                        Err(_) => eprintln!("error: {}", payload.message),
                    }
                }
                OutputFormat::Table => eprintln!("error: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Scan {
            manifest,
            queries,
            history,
            format,
            pro_key,
        } => {
            let request = ScanRequest {
                manifest_path: manifest,
                queries_path: queries,
                source: if history {
                    QuerySource::QueryHistory
                } else {
                    QuerySource::UsageRecords
                },
                access_key: pro_key,
            };
            let outcome = state.services.waste.scan(&request)?;
            match format {
                OutputFormat::Table => print!("{}", render::scan_table(&outcome)),
                OutputFormat::Json => print_json(&outcome)?,
            }
        }
        Commands::Attribute {
            manifest,
            history,
            top_n,
            format,
        } => {
            let run = state
                .services
                .attribution
                .attribute(&manifest, &history, top_n)?;
            match format {
                OutputFormat::Table => print!("{}", render::attribution_table(&run)),
                OutputFormat::Json => print_json(&run)?,
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
