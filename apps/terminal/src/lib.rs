//! # Wash & Fold Terminal Library
//!
//! The counter side of the POS: configuration, the ticket session, and the
//! commands that talk to the data store and the receipt printer.
//!
//! ## Module Organization
//! ```text
//! washfold_terminal_lib/
//! ├── lib.rs          ◄─── You are here (tracing setup)
//! ├── cli.rs          ◄─── Command-line interface (clap)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── config.rs   ◄─── terminal.toml + WASHFOLD_* overrides
//! │   ├── session.rs  ◄─── Current ticket and checkout
//! │   └── store.rs    ◄─── Data-store collaborators
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── quote.rs    ◄─── Ticket pricing
//! │   ├── order.rs    ◄─── Checkout, workflow, refunds, board
//! │   ├── receipt.rs  ◄─── Receipt print + archive
//! │   ├── closing.rs  ◄─── Daily closing
//! │   └── analytics.rs◄─── Sales KPIs
//! ├── printer.rs      ◄─── Printer seam
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Collaborators
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐   │
//! │  │  TerminalConfig  │ │     Session      │ │     StoreState       │   │
//! │  │  (read-only)     │ │  (&mut, 1/counter│ │  (Arc<dyn ...Store>) │   │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘   │
//! │                                                                         │
//! │  Each command takes only the collaborators it needs.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod printer;
pub mod state;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so receipts and JSON on stdout stay clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=washfold=trace` - Show trace for washfold crates only
/// - Default: INFO, DEBUG for washfold crates
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,washfold=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .with_writer(std::io::stderr)
        .init();
}
