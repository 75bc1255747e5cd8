//! # Wash & Fold Terminal Entry Point
//!
//! ## Startup Sequence
//! 1. Parse the command line
//! 2. Initialize tracing (logging)
//! 3. Load configuration (defaults → terminal.toml → environment)
//! 4. Run the subcommand against an in-memory store and the stdout printer

use clap::Parser;
use std::process::ExitCode;
use washfold_terminal_lib::cli::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    washfold_terminal_lib::init_tracing();
    run(cli).await
}
