use std::path::PathBuf;

use clap::Parser;
use itinerary::cli::commands::Cli;
use itinerary::cli::handlers;
use itinerary::io::config_io;
use itinerary::logging;

fn main() {
    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(config_io::default_data_dir);

    let config = match config_io::read_config(&data_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let level = config
        .log
        .level
        .as_deref()
        .unwrap_or(logging::default_log_level());
    if let Err(e) = logging::init_logging(level, &data_dir.join("logs")) {
        eprintln!("warning: file logging disabled: {}", e);
    }

    if let Err(e) = handlers::dispatch(cli, &data_dir, &config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
