//! Command-line configuration

use std::path::PathBuf;

use clap::{Args, Parser};

/// Reward engine configuration
#[derive(Debug, Parser)]
#[command(
    name = "reward-engine",
    about = "Evaluate a purchase event against an owner's reward rule",
    long_about = None
)]
pub(crate) struct Config {
    /// Fixture locations.
    #[command(flatten)]
    pub fixtures: FixtureConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Owner id whose rule the event is evaluated against
    pub owner_id: String,

    /// JSON event file, `-` reads standard input
    #[arg(short, long, default_value = "-")]
    pub event: PathBuf,

    /// Summary output format
    #[arg(short, long, env = "REWARD_OUTPUT", value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Whether the event is read from standard input.
    pub fn event_from_stdin(&self) -> bool {
        self.event.as_os_str() == "-"
    }
}

/// Fixture settings.
#[derive(Debug, Args)]
pub(crate) struct FixtureConfig {
    /// Fixture base directory
    #[arg(long = "fixtures", env = "REWARD_FIXTURES", default_value = "./fixtures")]
    pub path: PathBuf,

    /// Rule set name, read from `<fixtures>/rules/<name>.yml`
    #[arg(long, env = "REWARD_RULE_SET", default_value = "default")]
    pub rules: String,

    /// Channel set name, read from `<fixtures>/channels/<name>.yml`
    #[arg(long, env = "REWARD_CHANNEL_SET", default_value = "default")]
    pub channels: String,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Summary output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Pretty-printed JSON.
    Json,

    /// Table.
    Table,
}

/// Logging settings.
#[derive(Debug, Args)]
pub(crate) struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
