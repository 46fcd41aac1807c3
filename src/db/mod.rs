// Database module - SQLite connection and models

pub mod models;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::config;
pub use models::{Security, Transaction, TransactionAction};

/// Get the default database path (~/.tradersan/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    Ok(config::config_home()?.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = db_path.unwrap_or(get_default_db_path()?);
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;

    // Enable foreign keys
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    Ok(conn)
}

/// Initialize the database with schema
///
/// Creates the database file if needed and runs the schema SQL to set up
/// all tables and indexes. The schema is idempotent.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = db_path.unwrap_or(get_default_db_path()?);

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;

    let schema_sql = include_str!("schema.sql");
    conn.execute_batch(schema_sql)
        .context("Failed to execute schema")?;

    Ok(())
}

/// Insert or get security, returns security_id
pub fn upsert_security(conn: &Connection, symbol: &str, name: Option<&str>) -> Result<i64> {
    let symbol = symbol.trim().to_uppercase();

    let mut stmt = conn.prepare("SELECT id FROM securities WHERE symbol = ?1")?;
    let existing: Option<i64> = stmt.query_row([&symbol], |row| row.get(0)).optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO securities (symbol, name, created_at) VALUES (?1, ?2, ?3)",
        params![symbol, name, chrono::Utc::now()],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Get all securities ordered by symbol
pub fn get_all_securities(conn: &Connection) -> Result<Vec<Security>> {
    let mut stmt =
        conn.prepare("SELECT id, symbol, name, created_at FROM securities ORDER BY symbol ASC")?;

    let securities = stmt
        .query_map([], |row| {
            Ok(Security {
                id: Some(row.get(0)?),
                symbol: row.get(1)?,
                name: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(securities)
}

/// Insert transaction
pub fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (
            security_id, action, trade_date, quantity, price_per_unit,
            amount, fee, account, source, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            tx.security_id,
            tx.action.as_str(),
            tx.trade_date,
            tx.quantity.to_string(),
            tx.price_per_unit.to_string(),
            tx.amount.to_string(),
            tx.fee.to_string(),
            tx.account,
            tx.source,
            tx.created_at,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Check whether an identical transaction is already recorded (used to
/// skip duplicates during import)
pub fn transaction_exists(
    conn: &Connection,
    security_id: i64,
    trade_date: &NaiveDate,
    action: &TransactionAction,
    quantity: &Decimal,
) -> Result<bool> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM transactions
         WHERE security_id = ?1 AND trade_date = ?2 AND action = ?3 AND quantity = ?4",
    )?;

    let count: i64 = stmt.query_row(
        params![security_id, trade_date, action.as_str(), quantity.to_string()],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

/// Get all transactions for a security in replay order (date, then
/// insertion order for identical dates), optionally cut off at a date
pub fn get_security_transactions(
    conn: &Connection,
    security_id: i64,
    up_to: Option<NaiveDate>,
) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, security_id, action, trade_date, quantity, price_per_unit,
                amount, fee, account, source, created_at
         FROM transactions
         WHERE security_id = ?1 AND (?2 IS NULL OR trade_date <= ?2)
         ORDER BY trade_date ASC, id ASC",
    )?;

    let transactions = stmt
        .query_map(params![security_id, up_to], map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

/// Largest quantity a sell dated `on_date` could take without starving
/// any sell already recorded later in the log.
///
/// A new sell sorts after every existing transaction with the same or an
/// earlier trade date, and subtracts from the running position at every
/// point after that. The log stays replayable iff the running position
/// never goes negative, so the answer is the minimum running position
/// from the insertion point through the end of the log. This guards
/// against backdated sells poisoning an otherwise valid history.
pub fn max_sellable_on_date(
    conn: &Connection,
    security_id: i64,
    on_date: NaiveDate,
) -> Result<Decimal> {
    let mut stmt = conn.prepare(
        "SELECT action, quantity, trade_date
         FROM transactions
         WHERE security_id = ?1
         ORDER BY trade_date ASC, id ASC",
    )?;

    let mut rows = stmt.query(params![security_id])?;
    let mut running = Decimal::ZERO;
    let mut floor: Option<Decimal> = None;

    while let Some(row) = rows.next()? {
        let action: String = row.get(0)?;
        let quantity = get_decimal_value(row, 1).context("Failed to parse transaction quantity")?;
        let trade_date: NaiveDate = row.get(2)?;

        // Crossing into dates after the sell: the position here is what
        // the new sell would see at its insertion point
        if trade_date > on_date && floor.is_none() {
            floor = Some(running);
        }

        match action.parse::<TransactionAction>() {
            Ok(TransactionAction::Buy) => running += quantity,
            Ok(TransactionAction::Sell) => running -= quantity,
            Err(_) => {
                return Err(anyhow::anyhow!(
                    "Unknown transaction action '{}' while computing position",
                    action
                ));
            }
        }

        if trade_date > on_date {
            floor = Some(floor.map_or(running, |f| f.min(running)));
        }
    }

    Ok(floor.unwrap_or(running))
}

/// List transactions across all securities, newest first, with symbols
pub fn list_transactions(
    conn: &Connection,
    symbol_filter: Option<&str>,
) -> Result<Vec<(String, Transaction)>> {
    let mut stmt = conn.prepare(
        "SELECT s.symbol, t.id, t.security_id, t.action, t.trade_date, t.quantity,
                t.price_per_unit, t.amount, t.fee, t.account, t.source, t.created_at
         FROM transactions t
         JOIN securities s ON s.id = t.security_id
         WHERE (?1 IS NULL OR s.symbol = ?1)
         ORDER BY t.trade_date DESC, t.id DESC",
    )?;

    let filter = symbol_filter.map(|s| s.trim().to_uppercase());
    let rows = stmt
        .query_map(params![filter], |row| {
            let symbol: String = row.get(0)?;
            Ok((
                symbol,
                Transaction {
                    id: Some(row.get(1)?),
                    security_id: row.get(2)?,
                    action: parse_action(row, 3)?,
                    trade_date: row.get(4)?,
                    quantity: get_decimal_value(row, 5)?,
                    price_per_unit: get_decimal_value(row, 6)?,
                    amount: get_decimal_value(row, 7)?,
                    fee: get_decimal_value(row, 8)?,
                    account: row.get(9)?,
                    source: row.get(10)?,
                    created_at: row.get(11)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: Some(row.get(0)?),
        security_id: row.get(1)?,
        action: parse_action(row, 2)?,
        trade_date: row.get(3)?,
        quantity: get_decimal_value(row, 4)?,
        price_per_unit: get_decimal_value(row, 5)?,
        amount: get_decimal_value(row, 6)?,
        fee: get_decimal_value(row, 7)?,
        account: row.get(8)?,
        source: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn parse_action(row: &Row, idx: usize) -> Result<TransactionAction, rusqlite::Error> {
    let text: String = row.get(idx)?;
    TransactionAction::from_str(&text).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown transaction action '{}'", text).into(),
        )
    })
}

/// Helper to read Decimal from SQLite (handles both TEXT and numeric affinity)
fn get_decimal_value(row: &Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    // TEXT storage is the normal case
    if let Ok(s) = row.get::<_, String>(idx) {
        return Decimal::from_str(&s)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)));
    }

    // INTEGER affinity leakage
    if let Ok(i) = row.get::<_, i64>(idx) {
        return Ok(Decimal::from(i));
    }

    // REAL affinity leakage
    if let Ok(f) = row.get::<_, f64>(idx) {
        return Decimal::try_from(f)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)));
    }

    Err(rusqlite::Error::InvalidColumnType(
        idx,
        "decimal".to_string(),
        rusqlite::types::Type::Null,
    ))
}
