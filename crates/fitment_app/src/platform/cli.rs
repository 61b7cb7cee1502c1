use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fitment",
    about = "Generate a fitment report for your database servers"
)]
pub struct Cli {
    /// VM names separated by commas (e.g. "VM1, VM2, VM3"); read from stdin when omitted
    #[arg(short = 't', long)]
    pub targets: Option<String>,

    /// Path to a RON config file
    #[arg(short = 'c', long, env = "FITMENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, env = "FITMENT_BASE_URL")]
    pub base_url: Option<String>,

    /// Milliseconds between progress reads, overrides the config file
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
