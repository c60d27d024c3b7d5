mod models;
mod service;
mod storage;
mod types;

use std::io::{stderr, stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

use crate::models::{DateRangeAndTypeFilter, DateRangeFilter, NewTransaction, Transaction, TransactionFilter};
use crate::service::{ServiceError, TransactionService};
use crate::storage::CsvStore;
use crate::types::{Amount, Timestamp, TransactionId, UserId, parse_timestamp};

const EXIT_FAULT: u8 = 1;
const EXIT_INVALID_INPUT: u8 = 2;
const EXIT_NOT_FOUND: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "transaction-ledger")]
#[command(about = "Record and query user transactions kept in CSV tables", long_about = None)]
struct Cli {
    /// Directory holding users.csv and transactions.csv
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// One of: error, warn, info, debug, trace
    #[arg(long, env = "LEDGER_LOG_LEVEL", default_value = "error")]
    log_level: String,

    #[command(subcommand)]
    command: Command
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every transaction
    List,
    /// Show a single transaction
    Get {
        id: TransactionId
    },
    /// Record a new transaction
    Add {
        #[arg(long)]
        user_id: UserId,
        #[arg(long = "type")]
        transaction_type: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: Amount,
        #[arg(long, value_parser = parse_timestamp)]
        date: Timestamp
    },
    /// Transactions belonging to a user
    User {
        user_id: UserId
    },
    /// Transactions of a type, ignoring letter case
    Type {
        transaction_type: String
    },
    /// Transactions dated within an inclusive range
    DateRange {
        #[arg(long, value_parser = parse_timestamp)]
        start: Option<Timestamp>,
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<Timestamp>
    },
    /// Transactions dated within an inclusive range with an exactly matching type
    Filter {
        #[arg(long, value_parser = parse_timestamp)]
        start: Option<Timestamp>,
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<Timestamp>,
        #[arg(long = "type")]
        transaction_type: Option<String>
    },
    /// A page of a user's transactions, newest first
    Search {
        #[arg(long)]
        user_id: UserId,
        #[arg(long, value_parser = parse_timestamp)]
        start: Timestamp,
        #[arg(long, value_parser = parse_timestamp)]
        end: Timestamp,
        #[arg(long = "type")]
        transaction_type: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,
        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        limit: i32
    }
}

/// What the caller gets back, before it is rendered.
enum Response {
    Rows(Vec<Transaction>),
    NotFound,
    BadRequest(&'static str)
}

impl Response {
    fn non_empty(rows: Vec<Transaction>) -> Self {
        if rows.is_empty() {
            Response::NotFound
        } else {
            Response::Rows(rows)
        }
    }
}

/// One line of command output.
#[derive(Serialize)]
struct OutputRow<'a> {
    transaction_id: TransactionId,
    user_id: UserId,
    transaction_type: &'a str,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Amount,
    transaction_date: Timestamp,
    created_at: Timestamp,
    username: Option<&'a str>
}

impl<'a> From<&'a Transaction> for OutputRow<'a> {
    fn from(transaction: &'a Transaction) -> Self {
        Self {
            transaction_id: transaction.transaction_id,
            user_id: transaction.user_id,
            transaction_type: &transaction.transaction_type,
            amount: transaction.amount,
            transaction_date: transaction.transaction_date,
            created_at: transaction.created_at,
            username: transaction.user.as_ref().map(|user| user.username.as_str())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    let response = match run(cli).await {
        Ok(response) => response,
        Err(error) => {
            error!("{error:#}");
            eprintln!("Error: {error:#}");

            let invalid_input = error.downcast_ref::<ServiceError>().is_some_and(ServiceError::is_invalid_input);
            return ExitCode::from(if invalid_input { EXIT_INVALID_INPUT } else { EXIT_FAULT });
        }
    };

    match response {
        Response::Rows(rows) => match write_results_to_stdout(&rows) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("Error: {error:#}");
                ExitCode::from(EXIT_FAULT)
            }
        },
        Response::NotFound => {
            eprintln!("Not found");
            ExitCode::from(EXIT_NOT_FOUND)
        }
        Response::BadRequest(reason) => {
            eprintln!("Bad request: {reason}");
            ExitCode::from(EXIT_INVALID_INPUT)
        }
    }
}

async fn run(cli: Cli) -> Result<Response> {
    let storage = Arc::new(CsvStore::open(&cli.data_dir).await?);
    let service = TransactionService::new(storage);

    let response = match cli.command {
        Command::List => {
            info!("Fetching all transactions");
            Response::Rows(service.get_all().await?)
        }
        Command::Get { id } => {
            info!("Fetching transaction with ID: {id}");

            match service.get_by_id(id).await? {
                Some(transaction) => Response::Rows(vec![transaction]),
                None => {
                    warn!("Transaction with ID {id} not found");
                    Response::NotFound
                }
            }
        }
        Command::Add { user_id, transaction_type, amount, date } => {
            let transaction = NewTransaction {
                user_id,
                transaction_type,
                amount,
                transaction_date: date
            };

            info!("Creating a new transaction: {transaction:?}");
            Response::Rows(vec![service.add(Some(transaction)).await?])
        }
        Command::User { user_id } => {
            info!("Fetching transactions for user ID: {user_id}");
            not_found_warning(Response::non_empty(service.get_by_user_id(user_id).await?), || format!("user ID: {user_id}"))
        }
        Command::Type { transaction_type } => {
            if transaction_type.trim().is_empty() {
                warn!("Transaction type cannot be empty");
                return Ok(Response::BadRequest("transaction type cannot be empty"));
            }

            info!("Fetching transactions of type: {transaction_type}");
            let rows = service.get_by_type(Some(transaction_type.as_str())).await?;
            not_found_warning(Response::non_empty(rows), || format!("type: {transaction_type}"))
        }
        Command::DateRange { start, end } => {
            let (Some(start), Some(end)) = (start, end) else {
                warn!("Start date and end date must be provided");
                return Ok(Response::BadRequest("start date and end date must be provided"));
            };

            let filter = DateRangeFilter::new(start, end);
            info!("Fetching transactions with criteria: {filter:?}");
            not_found_warning(Response::non_empty(service.get_by_date_range(&filter).await?), || format!("{filter:?}"))
        }
        Command::Filter { start, end, transaction_type } => {
            let Some(transaction_type) = transaction_type.filter(|value| !value.trim().is_empty()) else {
                warn!("Invalid filter parameters provided");
                return Ok(Response::BadRequest("invalid filter parameters"));
            };

            if start.is_none() || end.is_none() {
                warn!("Invalid filter parameters provided");
                return Ok(Response::BadRequest("invalid filter parameters"));
            }

            let filter = DateRangeAndTypeFilter { start_date: start, end_date: end, transaction_type };
            info!("Fetching transactions with criteria: {filter:?}");
            not_found_warning(Response::non_empty(service.get_by_date_range_and_type(&filter).await?), || format!("{filter:?}"))
        }
        Command::Search { user_id, start, end, transaction_type, offset, limit } => {
            let filter = TransactionFilter {
                user_id,
                start_date: start,
                end_date: end,
                transaction_type,
                offset,
                limit
            };

            info!("Fetching filtered transactions with criteria: {filter:?}");
            not_found_warning(Response::non_empty(service.get_filtered(&filter).await?), || format!("{filter:?}"))
        }
    };

    Ok(response)
}

fn not_found_warning(response: Response, criteria: impl FnOnce() -> String) -> Response {
    if let Response::NotFound = response {
        warn!("No transactions found for {}", criteria());
    }

    response
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: Results go to stdout as CSV, so logging has to stay on stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_results_to_stdout(rows: &[Transaction]) -> Result<()> {
    let mut output = csv::Writer::from_writer(stdout().lock());

    for row in rows {
        output.serialize(OutputRow::from(row))?;
    }

    output.flush()?;

    Ok(())
}
