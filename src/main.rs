use anyhow::Result;
use std::process;
use log::error;

use defectset::{app, cli, logging};

fn main() {
    if let Err(e) = run() {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let settings = app::build_pipeline_settings(&args, &config_manager)?;
    app::run_pipeline(settings, args.show_tickets)?;

    Ok(())
}
