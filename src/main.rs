use std::io;
use std::process::ExitCode;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chess_arena::config::ArenaConfig;
use chess_arena::console::console_top::run_stdio_loop;

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only command replies.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chess_arena=info")))
        .init();

    let config = ArenaConfig::from_env_or_default();
    tracing::info!(
        tolerance = config.matchmaking.rating_tolerance,
        k_factor = config.rating.k_factor,
        "chess arena console ready"
    );

    match run_stdio_loop(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "console loop failed");
            ExitCode::FAILURE
        }
    }
}
