use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "content-check")]
#[command(author, version, about = "Single-shot HTTP/HTTPS uptime and content check")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file with instance defaults
    #[arg(long, global = true, env = "CONTENT_CHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, env = "CONTENT_CHECK_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Verbose output (info-level logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one check from a JSON check request
    Run(RunArgs),

    /// Show the effective instance defaults
    Defaults,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// File holding the check request (reads stdin when omitted or "-")
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Include the request that was sent under a "request" key
    #[arg(long)]
    pub show_request: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Display as compact JSON (one line)
    Json,
    /// Display as indented JSON
    Pretty,
}
