use clap::Parser;
use std::process::ExitCode;

mod run;
mod settings;

use settings::Settings;

fn main() -> ExitCode {
    setup_logging();
    let settings = Settings::parse();
    run::run(&settings)
}

/// Initialize logging to stderr, keeping stdout for the per-file summaries
///
/// If RUST_LOG is not set, a default of `info` is used.
fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();
}
