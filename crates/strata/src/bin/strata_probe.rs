//! # STRATA Probe
//!
//! Runs the probe scenarios and exits non-zero if any fails.
//!
//! Usage: `strata_probe [CONFIG.toml]`
//!
//! Without a file the built-in defaults are used. `RUST_LOG` overrides the
//! configured log filter.

use std::env;
use std::panic;
use std::process::ExitCode;

use strata::{ProbeConfig, ProbeRunner};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &ProbeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn main() -> ExitCode {
    let config = match env::args().nth(1) {
        Some(path) => match ProbeConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("strata_probe: {err}");
                return ExitCode::from(2);
            }
        },
        None => ProbeConfig::default(),
    };

    init_tracing(&config);
    // Scenarios provoke panics on purpose and report them as outcomes.
    panic::set_hook(Box::new(|info| {
        tracing::debug!(%info, "panic contained by scenario");
    }));
    tracing::info!(
        elements = config.elements,
        fail_at_clone = config.fail_at_clone,
        "starting probe run"
    );

    let mut runner = ProbeRunner::new(config);
    runner.run_all();
    runner.print_results();

    if runner.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
