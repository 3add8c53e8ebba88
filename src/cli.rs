// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Command-line interface options for gmail-thread-probe.
///
/// Every flag is optional; with none given the full strategy suite runs
/// against the defaults.
#[derive(Parser, Debug)]
#[command(
    name = "gmail-thread-probe",
    version,
    about = "Find out which Gmail API send strategy keeps a reply in its thread",
    long_about = None
)]
pub struct Cli {
    /// Path to optional settings file
    #[arg(short, long, default_value = "thread-probe.yml")]
    pub config: PathBuf,

    /// OAuth client descriptor downloaded from Google Cloud Console
    #[arg(long, env = "GMAIL_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Where the OAuth token is cached
    #[arg(long, env = "GMAIL_TOKEN")]
    pub token: Option<PathBuf>,

    /// Gmail search used to pick the message to reply to
    #[arg(short, long)]
    pub query: Option<String>,

    /// Seconds to wait before re-reading the thread after a send
    #[arg(long)]
    pub settle_secs: Option<u64>,

    /// Seconds to wait between strategies
    #[arg(long)]
    pub pace_secs: Option<u64>,

    #[arg(short, long, help = "turn on debug logging")]
    pub debug: bool,
}
