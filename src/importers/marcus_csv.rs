use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::RawTrade;
use crate::db::TransactionAction;

/// Parse a Marcus Invest activity export and extract buy/sell trades
///
/// Marcus tags each row with a single-letter transaction code: B (buy),
/// S (sell), A (ACH), C (capital gain), D (dividend), F (fee),
/// T (transfer). Only B and S rows enter the lot ledger.
pub fn parse_marcus_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<RawTrade>> {
    let path = file_path.as_ref();
    info!("Parsing Marcus Invest CSV file: {:?}", path);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("Failed to open CSV file")?;

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let columns = MarcusColumns::find(&headers)?;
    debug!("Marcus column mapping: {:?}", columns);

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

    info!("Parsed {} trades from Marcus export", trades.len());
    Ok(trades)
}

#[derive(Debug)]
struct MarcusColumns {
    date: usize,
    transaction: usize,
    desc: usize,
    quantity: usize,
    price: usize,
    credit: usize,
    debit: usize,
}

impl MarcusColumns {
    fn find(headers: &csv::StringRecord) -> Result<Self> {
        let index_of = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        Ok(Self {
            date: index_of("Date").ok_or_else(|| anyhow!("Date column not found"))?,
            transaction: index_of("Transaction")
                .ok_or_else(|| anyhow!("Transaction column not found"))?,
            desc: index_of("Desc").ok_or_else(|| anyhow!("Desc column not found"))?,
            quantity: index_of("Quantity").ok_or_else(|| anyhow!("Quantity column not found"))?,
            price: index_of("Price").ok_or_else(|| anyhow!("Price column not found"))?,
            credit: index_of("Credit").ok_or_else(|| anyhow!("Credit column not found"))?,
            debit: index_of("Debit").ok_or_else(|| anyhow!("Debit column not found"))?,
        })
    }
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &MarcusColumns,
    row_num: usize,
) -> Result<Option<RawTrade>> {
    let code = record
        .get(columns.transaction)
        .ok_or_else(|| anyhow!("Missing transaction code at row {}", row_num))?
        .trim();

    let action = match code {
        "B" => TransactionAction::Buy,
        "S" => TransactionAction::Sell,
        "A" | "C" | "D" | "F" | "T" => {
            debug!("Row {}: skipping non-trade code '{}'", row_num, code);
            return Ok(None);
        }
        other => {
            return Err(anyhow!("Unknown transaction code '{}'", other));
        }
    };

    let symbol = record
        .get(columns.desc)
        .ok_or_else(|| anyhow!("Missing symbol at row {}", row_num))?
        .trim()
        .to_uppercase();
    if symbol.is_empty() {
        return Ok(None);
    }

    let date_str = record
        .get(columns.date)
        .ok_or_else(|| anyhow!("Missing date at row {}", row_num))?;
    let trade_date = parse_marcus_date(date_str)?;

    let quantity = parse_money(
        record
            .get(columns.quantity)
            .ok_or_else(|| anyhow!("Missing quantity at row {}", row_num))?,
    )?;
    if quantity <= Decimal::ZERO {
        return Err(anyhow!("Non-positive quantity at row {}", row_num));
    }

    let price = parse_money(
        record
            .get(columns.price)
            .ok_or_else(|| anyhow!("Missing price at row {}", row_num))?,
    )?;

    // Amount = Credit - Debit; buys show up as debits, sells as credits
    let credit = record
        .get(columns.credit)
        .and_then(|s| parse_money(s).ok())
        .unwrap_or(Decimal::ZERO);
    let debit = record
        .get(columns.debit)
        .and_then(|s| parse_money(s).ok())
        .unwrap_or(Decimal::ZERO);
    let amount = (credit - debit).abs();

    Ok(Some(RawTrade {
        symbol,
        action,
        trade_date,
        quantity,
        price,
        amount,
        fee: Decimal::ZERO,
    }))
}

fn parse_marcus_date(date_str: &str) -> Result<NaiveDate> {
    let trimmed = date_str.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    Err(anyhow!("Could not parse date: {}", date_str))
}

fn parse_money(text: &str) -> Result<Decimal> {
    let cleaned = text.replace('$', "").replace(',', "").trim().to_string();
    if cleaned.is_empty() {
        return Err(anyhow!("Empty numeric cell"));
    }
    Decimal::from_str(&cleaned).context("Failed to parse decimal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_parse_full_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marcus.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Date,Transaction,Desc,Quantity,Price,Credit,Debit").unwrap();
        writeln!(file, "03/01/2024,B,VTI,2.5,\"$217.31\",$0.00,\"$543.28\"").unwrap();
        writeln!(file, "03/15/2024,D,VTI,0,$0.00,$1.92,$0.00").unwrap();
        writeln!(file, "04/01/2024,S,VTI,1,\"$225.00\",\"$225.00\",$0.00").unwrap();
        writeln!(file, "04/02/2024,A,,0,$0.00,$500.00,$0.00").unwrap();

        let trades = parse_marcus_csv(&path).unwrap();
        assert_eq!(trades.len(), 2);

        assert_eq!(trades[0].symbol, "VTI");
        assert_eq!(trades[0].action, TransactionAction::Buy);
        assert_eq!(trades[0].quantity, dec!(2.5));
        assert_eq!(trades[0].price, dec!(217.31));
        assert_eq!(trades[0].amount, dec!(543.28));

        assert_eq!(trades[1].action, TransactionAction::Sell);
        assert_eq!(trades[1].amount, dec!(225.00));
        assert_eq!(trades[1].fee, Decimal::ZERO);
    }

    #[test]
    fn test_unknown_code_is_reported_not_silently_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marcus.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Date,Transaction,Desc,Quantity,Price,Credit,Debit").unwrap();
        writeln!(file, "03/01/2024,X,VTI,1,$10.00,$0.00,$10.00").unwrap();

        // Unknown codes are logged and skipped at the file level
        let trades = parse_marcus_csv(&path).unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn test_parse_marcus_date_formats() {
        assert_eq!(
            parse_marcus_date("03/01/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(
            parse_marcus_date("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }
}
