use clap::Parser;
use log::{error, info};
use mammoprep_core::cli::{Cli, OutputFormat};
use mammoprep_core::{DatasetPreparer, RunSummary, TextReport};
use std::process;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    if !cli.data_dir.is_dir() {
        eprintln!("Error: {} is not a directory", cli.data_dir.display());
        process::exit(1);
    }

    let config = cli.to_config();
    info!(
        "Preparing {} from {} into {}",
        config.task_name(),
        config.data_dir.display(),
        config.out_dir.display()
    );

    let summary = match DatasetPreparer::new(config).run() {
        Ok(summary) => summary,
        Err(e) => {
            error!("Preparation failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    output_summary(&summary, cli.format);
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn output_summary(summary: &RunSummary, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("{}", TextReport::new(summary));
        }
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                match serde_json::to_string_pretty(summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize to JSON: {}", e);
                        eprintln!("Error: Failed to serialize to JSON: {}", e);
                        process::exit(1);
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            {
                let _ = summary;
                eprintln!("Error: JSON output requires the 'json' feature");
                eprintln!("Rebuild with: cargo build --features json");
                process::exit(1);
            }
        }
    }
}
