use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON on stdout
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "pipecost")]
#[command(version)]
#[command(about = "Attribute warehouse credits to dbt models and find wasted spend", long_about = None)]
pub struct Cli {
    /// TOML file with policy thresholds (default: $PIPECOST_CONFIG, then ~/.config/pipecost/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect zombie, over-scheduled and redundant models
    Scan {
        /// dbt manifest.json
        manifest: PathBuf,
        /// Usage records, or a raw query history with --history
        queries: PathBuf,
        /// Treat QUERIES as a raw warehouse query history and attribute it first
        #[arg(long)]
        history: bool,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// Access token unlocking recommendations and the full manifest
        #[arg(long, env = "PIPECOST_PRO_KEY", hide_env_values = true)]
        pro_key: Option<String>,
    },
    /// Attribute a raw query history to models, with a monthly breakdown
    Attribute {
        /// dbt manifest.json
        manifest: PathBuf,
        /// Raw warehouse query history (JSON array)
        history: PathBuf,
        /// Contributors kept per month
        #[arg(long, value_name = "N")]
        top_n: Option<usize>,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

impl Commands {
    pub fn format(&self) -> OutputFormat {
        match self {
            Self::Scan { format, .. } | Self::Attribute { format, .. } => *format,
        }
    }
}
