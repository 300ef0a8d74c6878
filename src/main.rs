use clap::Parser;

use log::{error, info};
use std::process::ExitCode;

use voc2tfrecord::{process_dataset, Args};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting the conversion process...");

    match process_dataset(&config) {
        Ok(summary) => {
            info!(
                "Wrote {} training and {} validation records to {}",
                summary.train.written,
                summary.val.written,
                config.output_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to convert dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
