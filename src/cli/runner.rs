//! Command execution
//!
//! Takes the parsed CLI, resolves configuration and the database, and
//! runs the requested command. All terminal output goes through
//! `formatters` so table and JSON rendering stay in one place.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::info;

use super::formatters;
use super::{Cli, Commands, PortfolioCommands, TaxCommands, TransactionCommands};
use crate::config::Config;
use crate::db::{self, Transaction, TransactionAction};
use crate::error::LedgerError;
use crate::importers::{self, Broker};
use crate::reports;
use crate::tax::{self, TaxRates};

pub fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load()?;
    let db_path = cli.db.clone().or_else(|| config.db_path.clone());
    let rates = TaxRates::from(&config);

    // Import defers opening the database so a dry run leaves no trace
    if let Commands::Import {
        ref file,
        ref broker,
        ref account,
        dry_run,
    } = cli.command
    {
        return handle_import(
            db_path,
            file,
            broker.as_deref(),
            account.clone(),
            dry_run,
            cli.json,
        );
    }

    db::init_database(db_path.clone())?;
    let conn = db::open_db(db_path)?;

    match cli.command {
        Commands::Import { .. } => unreachable!(),

        Commands::Portfolio { ref action } => match action {
            PortfolioCommands::Show { at } => {
                let as_of = at.as_deref().map(parse_date).transpose()?;
                let report = reports::portfolio_report(&conn, as_of, &rates)?;
                if cli.json {
                    println!("{}", formatters::format_portfolio_json(&report));
                } else {
                    println!("{}", formatters::format_portfolio_table(&report));
                }
                Ok(())
            }
            PortfolioCommands::Lots { within, symbol } => {
                let lots = reports::upcoming_long_term_lots(
                    &conn,
                    *within,
                    symbol.as_deref(),
                    None,
                    &rates,
                )?;
                if cli.json {
                    println!("{}", formatters::format_lots_json(&lots));
                } else {
                    println!("{}", formatters::format_lots_table(&lots, *within));
                }
                Ok(())
            }
        },

        Commands::Tax { ref action } => match action {
            TaxCommands::Report { year } => {
                let gains = tax::calculate_annual_gains(&conn, *year, &rates)?;
                if cli.json {
                    println!("{}", formatters::format_tax_report_json(&gains));
                } else {
                    println!("{}", formatters::format_tax_report_table(&gains));
                }
                Ok(())
            }
            TaxCommands::Summary { year } => {
                let gains = tax::calculate_annual_gains(&conn, *year, &rates)?;
                let summary = reports::summarize_by_security(&gains);
                if cli.json {
                    println!("{}", formatters::format_tax_summary_json(*year, &summary));
                } else {
                    println!("{}", formatters::format_tax_summary_table(*year, &summary));
                }
                Ok(())
            }
        },

        Commands::Transactions { ref action } => match action {
            TransactionCommands::Add {
                symbol,
                action,
                quantity,
                price,
                date,
                fee,
                account,
            } => handle_transaction_add(
                &conn,
                &config,
                symbol,
                action,
                quantity,
                price,
                date,
                fee.as_deref(),
                account.clone(),
                cli.json,
            ),
            TransactionCommands::List { symbol } => {
                let transactions = db::list_transactions(&conn, symbol.as_deref())?;
                if cli.json {
                    println!("{}", formatters::format_transactions_json(&transactions));
                } else {
                    println!("{}", formatters::format_transactions_table(&transactions));
                }
                Ok(())
            }
        },
    }
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}', expected YYYY-MM-DD", text))
}

fn parse_decimal(text: &str, what: &str) -> Result<Decimal> {
    Decimal::from_str(text.trim()).map_err(|_| anyhow!("Invalid {} '{}'", what, text))
}

/// Import trades from a broker CSV export
fn handle_import(
    db_path: Option<std::path::PathBuf>,
    file_path: &str,
    broker: Option<&str>,
    account: Option<String>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    use tabled::{settings::Style, Table, Tabled};

    info!("Importing trades from: {}", file_path);

    let broker_override = match broker {
        Some(text) => Some(
            text.parse::<Broker>()
                .map_err(|_| anyhow!("Unknown broker '{}'. Supported: schwab, marcus", text))?,
        ),
        None => None,
    };

    let (detected, trades) = importers::import_file(file_path, broker_override)?;

    if !json {
        println!(
            "\n{} Found {} trades ({} format)\n",
            "✓".green().bold(),
            trades.len(),
            detected.as_str()
        );

        #[derive(Tabled)]
        struct TradePreview {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Symbol")]
            symbol: String,
            #[tabled(rename = "Action")]
            action: String,
            #[tabled(rename = "Shares")]
            shares: String,
            #[tabled(rename = "Price")]
            price: String,
            #[tabled(rename = "Fee")]
            fee: String,
        }

        let preview: Vec<TradePreview> = trades
            .iter()
            .take(10)
            .map(|t| TradePreview {
                date: t.trade_date.to_string(),
                symbol: t.symbol.clone(),
                action: t.action.as_str().to_string(),
                shares: crate::utils::format_quantity(t.quantity),
                price: crate::utils::format_currency(t.price),
                fee: crate::utils::format_currency(t.fee),
            })
            .collect();

        let table = Table::new(preview).with(Style::rounded()).to_string();
        println!("{}", table);

        if trades.len() > 10 {
            println!("\n... and {} more trades", trades.len() - 10);
        }
    }

    if dry_run {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "broker": detected.as_str(),
                    "found": trades.len(),
                    "dry_run": true,
                })
            );
        } else {
            println!("\n{} Dry run - no changes saved", "ℹ".blue().bold());
        }
        return Ok(());
    }

    db::init_database(db_path.clone())?;
    let conn = db::open_db(db_path)?;

    let mut imported = 0;
    let mut skipped = 0;

    for trade in &trades {
        let security_id = db::upsert_security(&conn, &trade.symbol, None)
            .context(format!("Failed to register security {}", trade.symbol))?;

        if db::transaction_exists(
            &conn,
            security_id,
            &trade.trade_date,
            &trade.action,
            &trade.quantity,
        )? {
            skipped += 1;
            continue;
        }

        let transaction = trade.to_transaction(security_id, account.clone(), detected);
        db::insert_transaction(&conn, &transaction)?;
        imported += 1;
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "broker": detected.as_str(),
                "found": trades.len(),
                "imported": imported,
                "skipped": skipped,
            })
        );
    } else {
        println!("\n{} Import complete!", "✓".green().bold());
        println!("  Imported: {}", imported.to_string().green());
        if skipped > 0 {
            println!("  Skipped (duplicates): {}", skipped.to_string().yellow());
        }
    }

    Ok(())
}

/// Record a manual buy or sell
#[allow(clippy::too_many_arguments)]
fn handle_transaction_add(
    conn: &Connection,
    config: &Config,
    symbol: &str,
    action: &str,
    quantity: &str,
    price: &str,
    date: &str,
    fee: Option<&str>,
    account: Option<String>,
    json: bool,
) -> Result<()> {
    let action = action
        .parse::<TransactionAction>()
        .map_err(|_| anyhow!("Invalid action '{}', expected buy or sell", action))?;
    let quantity = parse_decimal(quantity, "quantity")?;
    let price = parse_decimal(price, "price")?;
    let trade_date = parse_date(date)?;

    if quantity <= Decimal::ZERO {
        bail!(LedgerError::ValidationError(
            "quantity must be positive".to_string()
        ));
    }
    if price < Decimal::ZERO {
        bail!(LedgerError::ValidationError(
            "price cannot be negative".to_string()
        ));
    }

    // Buys carry no fee in this model; the flat sale fee defaults from config
    let fee = match action {
        TransactionAction::Buy => Decimal::ZERO,
        TransactionAction::Sell => match fee {
            Some(text) => parse_decimal(text, "fee")?,
            None => config.sale_fee,
        },
    };

    let security_id = db::upsert_security(conn, symbol, None)?;

    // Reject oversells up front so the stored ledger always replays
    // cleanly. The check looks past the sell date too, so a backdated
    // sell cannot starve a sell already recorded later in the log.
    if action == TransactionAction::Sell {
        let available = db::max_sellable_on_date(conn, security_id, trade_date)?;
        if quantity > available {
            bail!(LedgerError::InsufficientHoldings {
                symbol: symbol.trim().to_uppercase(),
                requested: quantity,
                available,
            });
        }
    }

    let tx = Transaction::manual(security_id, action, trade_date, quantity, price, fee, account);
    let id = db::insert_transaction(conn, &tx)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "id": id,
                "symbol": symbol.trim().to_uppercase(),
                "action": action.as_str(),
                "recorded": true,
            })
        );
    } else {
        println!(
            "{} Recorded {} {} {} @ {}",
            "✓".green().bold(),
            action.as_str(),
            crate::utils::format_quantity(quantity),
            symbol.trim().to_uppercase(),
            crate::utils::format_currency(price)
        );
    }

    Ok(())
}
