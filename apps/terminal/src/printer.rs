//! # Printer Seam
//!
//! The receipt printer is an external collaborator. Commands hand it
//! finished text and a printer name; how the bytes reach paper is the
//! implementation's business.
//!
//! ```text
//! render_receipt / render_closing_report
//!            │ String
//!            ▼
//!   Printer::print(name, text) ──► StdoutPrinter (CLI, development)
//!                              └─► thermal printer driver (deployment)
//! ```

use async_trait::async_trait;
use std::io::Write;
use thiserror::Error;
use tracing::debug;

/// Printing errors.
#[derive(Debug, Error)]
pub enum PrintError {
    /// No printer name was configured for this terminal.
    #[error("No printer configured")]
    NotConfigured,

    #[error("Printer not found: {0}")]
    NotFound(String),

    /// The printer accepted the connection but refused the job
    /// (out of paper, cover open, offline).
    #[error("Printer rejected the job: {0}")]
    Rejected(String),

    #[error("Printer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Printer: Send + Sync {
    /// Sends one job. Each call is one cut receipt.
    async fn print(&self, printer_name: &str, text: &str) -> Result<(), PrintError>;
}

/// Writes jobs to standard output, one after another, separated by a form
/// feed marker line.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutPrinter;

#[async_trait]
impl Printer for StdoutPrinter {
    async fn print(&self, printer_name: &str, text: &str) -> Result<(), PrintError> {
        if printer_name.trim().is_empty() {
            return Err(PrintError::NotConfigured);
        }
        debug!(printer = printer_name, bytes = text.len(), "Printing to stdout");
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", text)?;
        writeln!(out, "--- cut ---")?;
        out.flush()?;
        Ok(())
    }
}
