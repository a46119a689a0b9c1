//! OpenAPI from routes - Command-line tool printing the pet-store OpenAPI document.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-routes [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Print JSON documentation:
//! ```bash
//! openapi-from-routes
//! ```
//!
//! Write the `admin` specification as YAML:
//! ```bash
//! openapi-from-routes --spec admin -f yaml -o admin.yaml
//! ```
//!
//! List the available specifications:
//! ```bash
//! openapi-from-routes --list-specs
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_routes::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI from routes starting...");
    cli::log_args(&args);

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
