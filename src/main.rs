mod app;
mod cli;
mod output;

use std::process;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// Usage: randexp [-f FLAGS] [-n COUNT] [-t TARGET | -r LOG] [--show-log] <pattern>
fn main() {
    init_tracing();

    let cfg = cli::parse_args();
    if let Err(err) = app::run(cfg) {
        eprintln!("randexp: {err:#}");
        process::exit(2);
    }
}

/// Logs to stderr, only when `RUST_LOG` is set (e.g. `RUST_LOG=randexp=trace`).
fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}
