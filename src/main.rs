mod cli;

use std::{io, process};

use logreplay::config::Config;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    // Logs go to stderr so stdout stays machine-readable.
    let fallback = config.log_filter.as_deref().unwrap_or("warn");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = cli::run(&config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
