use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dmarc-summary",
    about = "Fetch and display DMARC summary reports from a dmarc report server",
    version,
    long_about = None
)]
pub struct Args {
    /// Report server base URL (overrides the configuration)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Page location whose query string carries the report options
    #[arg(short, long)]
    pub location: Option<String>,

    /// Comma-separated domains to report on
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Report period: lastweek, lastmonth or lastndays:N
    #[arg(short, long)]
    pub period: Option<String>,

    /// Report format: text or html
    #[arg(short, long)]
    pub format: Option<String>,

    /// Change the report options interactively before fetching
    #[arg(long)]
    pub change: bool,

    /// List every selected domain in the options summary
    #[arg(long)]
    pub expand_domains: bool,

    /// Write the page as HTML to this file instead of printing text
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Path to a configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
