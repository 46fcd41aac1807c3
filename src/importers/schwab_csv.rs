use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::RawTrade;
use crate::db::TransactionAction;

/// Parse a Schwab transaction export and extract buy/sell trades
///
/// Non-trade rows (dividends, interest, transfers, ACH movements) are
/// skipped; they do not touch the lot ledger.
pub fn parse_schwab_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<RawTrade>> {
    let path = file_path.as_ref();
    info!("Parsing Schwab CSV file: {:?}", path);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("Failed to open CSV file")?;

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let columns = SchwabColumns::find(&headers)?;
    debug!("Schwab column mapping: {:?}", columns);

    let mut trades = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.context("Failed to read CSV record")?;

        match parse_row(&record, &columns, idx + 2) {
            Ok(Some(trade)) => trades.push(trade),
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping row {}: {}", idx + 2, e);
                continue;
            }
        }
    }

    info!("Parsed {} trades from Schwab export", trades.len());
    Ok(trades)
}

#[derive(Debug)]
struct SchwabColumns {
    date: usize,
    action: usize,
    symbol: usize,
    quantity: usize,
    price: usize,
    amount: usize,
    fees: Option<usize>,
}

impl SchwabColumns {
    fn find(headers: &csv::StringRecord) -> Result<Self> {
        let index_of = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        Ok(Self {
            date: index_of("Date").ok_or_else(|| anyhow!("Date column not found"))?,
            action: index_of("Action").ok_or_else(|| anyhow!("Action column not found"))?,
            symbol: index_of("Symbol").ok_or_else(|| anyhow!("Symbol column not found"))?,
            quantity: index_of("Quantity").ok_or_else(|| anyhow!("Quantity column not found"))?,
            price: index_of("Price").ok_or_else(|| anyhow!("Price column not found"))?,
            amount: index_of("Amount").ok_or_else(|| anyhow!("Amount column not found"))?,
            fees: index_of("Fees & Comm"),
        })
    }
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &SchwabColumns,
    row_num: usize,
) -> Result<Option<RawTrade>> {
    let action_text = record
        .get(columns.action)
        .ok_or_else(|| anyhow!("Missing action at row {}", row_num))?
        .trim();

    let action = match map_action(action_text) {
        Some(a) => a,
        None => {
            debug!("Row {}: skipping non-trade action '{}'", row_num, action_text);
            return Ok(None);
        }
    };

    let symbol = record
        .get(columns.symbol)
        .ok_or_else(|| anyhow!("Missing symbol at row {}", row_num))?
        .trim()
        .to_uppercase();
    if symbol.is_empty() {
        return Ok(None);
    }

    let date_str = record
        .get(columns.date)
        .ok_or_else(|| anyhow!("Missing date at row {}", row_num))?;
    let trade_date = parse_schwab_date(date_str)?;

    let quantity = parse_usd_decimal(
        record
            .get(columns.quantity)
            .ok_or_else(|| anyhow!("Missing quantity at row {}", row_num))?,
    )?;
    if quantity <= Decimal::ZERO {
        return Err(anyhow!("Non-positive quantity at row {}", row_num));
    }

    let price = parse_usd_decimal(
        record
            .get(columns.price)
            .ok_or_else(|| anyhow!("Missing price at row {}", row_num))?,
    )?;

    // Amount is negative for buys in Schwab exports; the ledger keeps
    // gross amounts positive and tracks direction via the action
    let amount = record
        .get(columns.amount)
        .and_then(|s| parse_usd_decimal(s).ok())
        .map(|a| a.abs())
        .unwrap_or(quantity * price);

    // Only sells carry a fee in the ledger model; a commission on a buy
    // row is ignored rather than stored
    let fee = match action {
        TransactionAction::Sell => columns
            .fees
            .and_then(|idx| record.get(idx))
            .and_then(|s| parse_usd_decimal(s).ok())
            .unwrap_or(Decimal::ZERO),
        TransactionAction::Buy => Decimal::ZERO,
    };

    Ok(Some(RawTrade {
        symbol,
        action,
        trade_date,
        quantity,
        price,
        amount,
        fee,
    }))
}

/// Map a Schwab action label onto the ledger's buy/sell model. Returns
/// None for actions that are out of scope for lot accounting.
fn map_action(action: &str) -> Option<TransactionAction> {
    match action {
        "Buy" | "Reinvest Shares" => Some(TransactionAction::Buy),
        "Sell" => Some(TransactionAction::Sell),
        _ => None,
    }
}

/// Parse a Schwab date cell. Settlement-adjusted rows look like
/// "01/15/2024 as of 01/12/2024"; the trailing 10 characters are always
/// the effective date.
fn parse_schwab_date(date_str: &str) -> Result<NaiveDate> {
    let trimmed = date_str.trim();
    if trimmed.len() < 10 {
        return Err(anyhow!("Could not parse date: {}", date_str));
    }

    let tail = &trimmed[trimmed.len() - 10..];
    NaiveDate::parse_from_str(tail, "%m/%d/%Y")
        .map_err(|_| anyhow!("Could not parse date: {}", date_str))
}

/// Parse a dollar cell: strips "$" and thousands commas
fn parse_usd_decimal(text: &str) -> Result<Decimal> {
    let cleaned = text.replace('$', "").replace(',', "").trim().to_string();
    if cleaned.is_empty() {
        return Err(anyhow!("Empty numeric cell"));
    }
    Decimal::from_str(&cleaned).context("Failed to parse decimal")
}
