use anyhow::Result;
use clap::Parser;
use tracing::error;

use dmarc_summary::utils::{setup_logging, validate_args};
use dmarc_summary::{app, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    match app::run(&args) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
