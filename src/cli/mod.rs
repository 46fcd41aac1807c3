use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;
pub mod runner;

#[derive(Parser)]
#[command(name = "tradersan")]
#[command(
    version,
    about = "Personal portfolio tracker with FIFO lot accounting"
)]
#[command(
    long_about = "Track your stock portfolio from broker CSV exports or manual entries. \
Sells are matched against purchase lots oldest-first (FIFO) and realized gains are \
classified short- or long-term with the corresponding flat tax rate."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Use this SQLite database instead of ~/.tradersan/data.db
    #[arg(long = "db", global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import trades from a broker CSV export (auto-detects the format)
    Import {
        /// Path to the CSV file
        file: String,

        /// Broker format override (schwab, marcus)
        #[arg(long)]
        broker: Option<String>,

        /// Account label to attach to imported trades (e.g. schb576)
        #[arg(long)]
        account: Option<String>,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Portfolio viewing
    Portfolio {
        #[command(subcommand)]
        action: PortfolioCommands,
    },

    /// Tax calculations and reports
    Tax {
        #[command(subcommand)]
        action: TaxCommands,
    },

    /// Manual transaction management
    Transactions {
        #[command(subcommand)]
        action: TransactionCommands,
    },
}

#[derive(Subcommand)]
pub enum PortfolioCommands {
    /// Show open positions (shares, cost basis, holding periods)
    Show {
        /// Show the portfolio as of this date (YYYY-MM-DD)
        #[arg(long)]
        at: Option<String>,
    },

    /// Show short-term lots about to turn long-term
    Lots {
        /// Window in days (lots crossing the threshold within this many days)
        #[arg(long, default_value_t = 7)]
        within: i64,

        /// Only show lots for this symbol
        #[arg(short, long)]
        symbol: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TaxCommands {
    /// List every realized gain record for a year
    Report {
        /// Year (e.g. 2024)
        year: i32,
    },

    /// Per-security realized gains summary for a year
    Summary {
        /// Year (e.g. 2024)
        year: i32,
    },
}

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a buy or sell manually
    Add {
        /// Ticker symbol (e.g. AAPL)
        symbol: String,

        /// buy or sell
        action: String,

        /// Number of shares (fractional allowed)
        quantity: String,

        /// Price per share
        price: String,

        /// Trade date (YYYY-MM-DD)
        date: String,

        /// Flat fee for this sale (defaults to the configured sale_fee)
        #[arg(long)]
        fee: Option<String>,

        /// Account label
        #[arg(long)]
        account: Option<String>,
    },

    /// List recorded transactions, newest first
    List {
        /// Only show transactions for this symbol
        #[arg(short, long)]
        symbol: Option<String>,
    },
}
