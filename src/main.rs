//! Reward Engine CLI
//!
//! Loads a fixture rule set, evaluates one event for an owner and prints the
//! resulting summary.

use std::{
    fs,
    io::{self, Read, Write},
    process::ExitCode,
};

use thiserror::Error;
use tracing::{error, info};

use reward_engine::{
    events::Event,
    fixtures::{Fixture, FixtureError},
    registry::{Registry, RegistryError},
    summary::{Summary, SummaryError},
};

use crate::config::{Config, OutputFormat};

mod config;
mod observability;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
enum CliError {
    /// Fixture files could not be loaded.
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// Registry load or evaluation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Reading the event or writing the summary failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The event or summary JSON was invalid.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The summary table could not be written.
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(source) => source.exit(),
    };

    if let Err(source) = observability::init(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("{source}");
        }

        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(source) => {
            error!("{source}");

            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), CliError> {
    let mut fixture = Fixture::with_base_path(&config.fixtures.path);

    fixture
        .load_channels(&config.fixtures.channels)?
        .load_rules(&config.fixtures.rules)?;

    let registry = Registry::load(&fixture, &fixture)?;
    let event = read_event(config)?;

    info!(owner_id = %config.owner_id, event_id = %event.id, "evaluating event");

    let summary = registry.evaluate_by_owner_id(&config.owner_id, &event)?;

    write_summary(&summary, config.output)
}

fn read_event(config: &Config) -> Result<Event, CliError> {
    let contents = if config.event_from_stdin() {
        let mut contents = String::new();
        io::stdin().read_to_string(&mut contents)?;
        contents
    } else {
        fs::read_to_string(&config.event)?
    };

    Ok(serde_json::from_str(&contents)?)
}

fn write_summary(summary: &Summary, format: OutputFormat) -> Result<(), CliError> {
    let mut out = io::stdout().lock();

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, summary)?;
            writeln!(out)?;
        }
        OutputFormat::Table => summary.write_to(&mut out)?,
    }

    Ok(())
}
