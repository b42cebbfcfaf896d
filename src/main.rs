//! sqlite-json - export SQLite tables and queries to JSON.
//!
//! Prints the exported JSON on standard output, or writes it to `--output`.
//! Errors go to standard error with a non-zero exit code.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use sqlite_json::{Exporter, Result};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let opts = cli::CliOpts::parse();

    setup_tracing(&opts.log_level);

    match run(opts).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(opts: cli::CliOpts) -> Result<()> {
    let exporter = Exporter::open(opts.database.as_path());

    if opts.list_tables {
        let tables = exporter.tables().await?;
        println!("{}", serde_json::to_string(&tables)?);
        return Ok(());
    }

    let options = opts.export_options();
    debug!(?options, "Parsed export options");

    match opts.output {
        Some(ref path) => {
            exporter.save(options, path).await?;
        }
        None => {
            let json = exporter.json(options).await?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Installs the log subscriber. Logs go to standard error.
fn setup_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
