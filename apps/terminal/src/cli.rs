//! # Command-Line Interface
//!
//! Runs the terminal commands against JSON exports, an in-memory store and
//! the stdout printer.
//!
//! ```text
//! washfold-terminal quote    --ticket ticket.json
//! washfold-terminal checkout --ticket ticket.json --method cash --tendered 20
//! washfold-terminal receipt  --order order.json --copy store
//! washfold-terminal closing  --orders orders.json --date 2024-03-15 \
//!                            --opening 50 --count count.json \
//!                            --close --by María [--confirm-variance]
//! washfold-terminal kpis     --orders orders.json --period month
//! washfold-terminal board    --orders orders.json
//! washfold-terminal config   [--save]
//! ```

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info, warn};
use washfold_core::{
    render_closing_report, AnalyticsPeriod, CashCount, Money, Order, PaymentMethod, ReceiptCopy,
    Ticket, User,
};
use washfold_store::MemoryStore;

use crate::commands::{self, order::build_payment, ClosingRequest};
use crate::error::ApiError;
use crate::printer::StdoutPrinter;
use crate::state::{Session, StoreState, TerminalConfig};

#[derive(Debug, Parser)]
#[command(name = "washfold-terminal", version, about = "Wash & Fold POS counter terminal")]
pub struct Cli {
    /// Path to terminal.toml (defaults to the platform config directory)
    #[arg(long, env = "WASHFOLD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Print command results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price a ticket
    Quote {
        #[arg(long)]
        ticket: PathBuf,
    },

    /// Store a ticket as an order and print its receipts
    Checkout {
        #[arg(long)]
        ticket: PathBuf,
        /// cash, card, yappy, ach, check, invoice, pickup, gift_card
        #[arg(long, default_value = "cash")]
        method: String,
        /// Cash handed over (cash only; exact change when omitted)
        #[arg(long)]
        tendered: Option<Decimal>,
        /// Voucher, confirmation or check number
        #[arg(long)]
        reference: Option<String>,
        /// Operator ringing up the order
        #[arg(long)]
        operator: Option<String>,
        /// Existing orders, so numbering continues after them
        #[arg(long)]
        orders: Option<PathBuf>,
    },

    /// Render one receipt copy
    Receipt {
        #[arg(long)]
        order: PathBuf,
        #[arg(long, value_enum, default_value_t = CopyArg::Customer)]
        copy: CopyArg,
    },

    /// Compute the daily closing, optionally closing the day
    Closing {
        #[arg(long)]
        orders: PathBuf,
        /// Local calendar date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Opening float (defaults to [cash] default_opening_balance)
        #[arg(long)]
        opening: Option<Decimal>,
        /// Cash count JSON
        #[arg(long)]
        count: Option<PathBuf>,
        #[arg(long)]
        notes: Option<String>,
        /// Close the day (store, print and archive the report)
        #[arg(long, requires = "by")]
        close: bool,
        /// Operator closing the day
        #[arg(long)]
        by: Option<String>,
        /// Accept a REVISAR variance
        #[arg(long)]
        confirm_variance: bool,
    },

    /// Sales KPIs for a period
    Kpis {
        #[arg(long)]
        orders: PathBuf,
        #[arg(long, value_enum, default_value_t = PeriodArg::Week)]
        period: PeriodArg,
    },

    /// Production board (open orders and the last week's finished ones)
    Board {
        #[arg(long)]
        orders: PathBuf,
    },

    /// Show the effective configuration
    Config {
        /// Write it to the config path
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CopyArg {
    Customer,
    Store,
}

impl From<CopyArg> for ReceiptCopy {
    fn from(arg: CopyArg) -> Self {
        match arg {
            CopyArg::Customer => ReceiptCopy::Customer,
            CopyArg::Store => ReceiptCopy::Store,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodArg {
    Today,
    Week,
    Month,
}

impl From<PeriodArg> for AnalyticsPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Today => AnalyticsPeriod::Today,
            PeriodArg::Week => AnalyticsPeriod::Week,
            PeriodArg::Month => AnalyticsPeriod::Month,
        }
    }
}

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("Cannot format output: {0}")]
    Output(String),
}

/// Runs one subcommand and prints any failure to stderr.
pub async fn run(cli: Cli) -> ExitCode {
    let config = match TerminalConfig::load(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    match execute(&cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: &Cli, config: TerminalConfig) -> Result<(), CliError> {
    let format = config.print_format();
    let now = Utc::now();

    match &cli.command {
        Command::Quote { ticket } => {
            let session = session_for(&config, read_json(ticket)?, None);
            let response = commands::quote(&session, &format, now);
            emit(cli.json, &response, || response.to_text(&format))
        }

        Command::Checkout {
            ticket,
            method,
            tendered,
            reference,
            operator,
            orders,
        } => {
            let store = load_store(orders.as_deref()).await?;
            let stores = StoreState::memory(store);
            let operator = operator.as_ref().map(|name| User::new(name.clone(), name.clone()));
            let mut session = session_for(&config, read_json(ticket)?, operator);
            session.refresh_settings(&*stores.settings).await;

            let total = session.totals(now).total;
            let payment = build_payment(
                PaymentMethod::from(method.as_str()),
                total,
                tendered.map(Money::new),
                reference.clone(),
            )?;
            let response =
                commands::checkout(&mut session, payment, &config, &stores, &StdoutPrinter, now)
                    .await?;
            for message in &response.receipts.errors {
                warn!("{}", message);
            }
            emit(cli.json, &response, || {
                format!(
                    "Orden #{} guardada ({})",
                    response.order.order_number,
                    format.money(response.order.total)
                )
            })
        }

        Command::Receipt { order, copy } => {
            let order: Order = read_json(order)?;
            let text = commands::render_copy(&order, &config, config.service.tax_rate, (*copy).into());
            println!("{}", text);
            Ok(())
        }

        Command::Closing {
            orders,
            date,
            opening,
            count,
            notes,
            close,
            by,
            confirm_variance,
        } => {
            let store = load_store(Some(orders.as_path())).await?;
            let cash_count: CashCount = match count {
                Some(path) => read_json(path)?,
                None => CashCount::new(),
            };
            let request = ClosingRequest {
                opening_balance: opening.map(Money::new),
                notes: notes.clone(),
                ..ClosingRequest::new(*date, cash_count)
            };
            let closing = commands::prepare_closing(&request, &config, &store, &store).await?;

            match (close, by) {
                (true, Some(by)) => {
                    let outcome = commands::close_day(
                        closing,
                        by,
                        *confirm_variance,
                        now,
                        &config,
                        &store,
                        &store,
                        &StdoutPrinter,
                    )
                    .await?;
                    for message in &outcome.errors {
                        warn!("{}", message);
                    }
                    info!(path = %outcome.path, "Closing archived");
                    if cli.json {
                        emit(true, &outcome, String::new)?;
                    }
                    Ok(())
                }
                _ => {
                    let preview =
                        render_closing_report(&closing, &config.store_info(), &format);
                    emit(cli.json, &closing, || preview.clone())
                }
            }
        }

        Command::Kpis { orders, period } => {
            let store = load_store(Some(orders.as_path())).await?;
            let response = commands::sales_kpis(&store, (*period).into(), &config, now).await?;
            emit(cli.json, &response, || response.to_text(&format))
        }

        Command::Board { orders } => {
            let store = load_store(Some(orders.as_path())).await?;
            let board = commands::order_board(&store, &config, now).await?;
            emit(cli.json, &board, || {
                board
                    .iter()
                    .map(|column| {
                        let numbers: Vec<String> = column
                            .orders
                            .iter()
                            .map(|o| format!("#{}", o.order_number))
                            .collect();
                        format!("{} ({}): {}", column.title, column.orders.len(), numbers.join(" "))
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }

        Command::Config { save } => {
            if *save {
                config.save(cli.config.clone()).map_err(ApiError::from)?;
            }
            let text = toml::to_string_pretty(&config).map_err(|e| CliError::Output(e.to_string()))?;
            println!("{}", text);
            Ok(())
        }
    }
}

fn session_for(config: &TerminalConfig, ticket: Ticket, operator: Option<User>) -> Session {
    Session::new(config.service, config.utc_offset(), operator).with_ticket(ticket)
}

/// A memory store seeded with the orders in `path`, if any.
async fn load_store(path: Option<&Path>) -> Result<MemoryStore, CliError> {
    let store = MemoryStore::new();
    if let Some(path) = path {
        let orders: Vec<Order> = read_json(path)?;
        let count = store.import_orders(orders).await.map_err(ApiError::from)?;
        info!(count, path = %path.display(), "Orders loaded");
    }
    Ok(store)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn emit<T: Serialize>(
    as_json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<(), CliError> {
    if as_json {
        let json =
            serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", json);
    } else {
        println!("{}", text());
    }
    Ok(())
}
