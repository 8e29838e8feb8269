//! `quizcast` binary.

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use quizcast_cli::Cli;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match quizcast_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr(), "error: {}", err.user_message());
            ExitCode::FAILURE
        },
    }
}
