//! Portfolio snapshot built from FIFO replay
//!
//! Positions are never stored; every report replays the transaction log
//! through the FIFO matcher and summarizes the lots still open. Holding
//! periods are cost-weighted so a position assembled over years reads as
//! one number.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use itertools::Itertools;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::db::{self, TransactionAction};
use crate::tax::{FifoMatcher, TaxRates};

/// Summary of a single open position
#[derive(Debug, Clone, Serialize)]
pub struct PositionSummary {
    pub symbol: String,
    pub shares: Decimal,
    pub cost_basis: Decimal,
    pub average_cost: Decimal,
    /// Cost-weighted average holding period in days, as of the report date
    pub weighted_holding_days: Decimal,
    /// Shares already past the long-term threshold
    pub long_term_shares: Decimal,
    pub long_term_cost: Decimal,
}

/// Complete portfolio snapshot
#[derive(Debug, Serialize)]
pub struct PortfolioReport {
    pub as_of: NaiveDate,
    pub positions: Vec<PositionSummary>,
    pub total_cost_basis: Decimal,
}

/// An open short-term lot approaching the long-term threshold
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingLot {
    pub symbol: String,
    pub acquired: NaiveDate,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub holding_days: i64,
    /// Days until the lot turns long-term
    pub days_to_long_term: i64,
}

/// Replay a security's history up to `as_of` and return its matcher state
fn replay_security(
    conn: &Connection,
    security_id: i64,
    symbol: &str,
    as_of: NaiveDate,
    rates: &TaxRates,
) -> Result<FifoMatcher> {
    let transactions = db::get_security_transactions(conn, security_id, Some(as_of))?;
    let mut matcher = FifoMatcher::new(symbol);

    for tx in &transactions {
        match tx.action {
            TransactionAction::Buy => matcher.add_purchase(tx),
            TransactionAction::Sell => {
                matcher.match_sale(tx, rates).context(format!(
                    "Failed to replay sale of {} on {}",
                    symbol, tx.trade_date
                ))?;
            }
        }
    }

    Ok(matcher)
}

/// Build the portfolio snapshot as of a date (today when None)
pub fn portfolio_report(
    conn: &Connection,
    as_of: Option<NaiveDate>,
    rates: &TaxRates,
) -> Result<PortfolioReport> {
    let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    info!("Building portfolio snapshot as of {}", as_of);

    let mut positions = Vec::new();
    let mut total_cost_basis = Decimal::ZERO;

    for security in db::get_all_securities(conn)? {
        let security_id = security.id.context("Security loaded without an id")?;
        let matcher = replay_security(conn, security_id, &security.symbol, as_of, rates)?;

        let shares = matcher.held_quantity();
        // Dust positions (under one share) are hidden from the snapshot
        if shares.abs() < Decimal::ONE {
            continue;
        }

        let cost_basis = matcher.cost_basis();
        let mut weighted_days = Decimal::ZERO;
        let mut long_term_shares = Decimal::ZERO;
        let mut long_term_cost = Decimal::ZERO;

        for lot in matcher.open_lots() {
            let days = (as_of - lot.acquired).num_days();
            weighted_days += lot.cost_basis() * Decimal::from(days);
            if days > rates.threshold_days {
                long_term_shares += lot.quantity;
                long_term_cost += lot.cost_basis();
            }
        }

        let average_cost = if shares > Decimal::ZERO {
            (cost_basis / shares).round_dp(4)
        } else {
            Decimal::ZERO
        };
        let weighted_holding_days = if cost_basis > Decimal::ZERO {
            (weighted_days / cost_basis).round_dp(1)
        } else {
            Decimal::ZERO
        };

        total_cost_basis += cost_basis;
        positions.push(PositionSummary {
            symbol: security.symbol,
            shares,
            cost_basis,
            average_cost,
            weighted_holding_days,
            long_term_shares,
            long_term_cost,
        });
    }

    Ok(PortfolioReport {
        as_of,
        positions,
        total_cost_basis,
    })
}

/// Find open short-term lots that cross the long-term threshold within
/// the next `within_days` days
pub fn upcoming_long_term_lots(
    conn: &Connection,
    within_days: i64,
    symbol_filter: Option<&str>,
    as_of: Option<NaiveDate>,
    rates: &TaxRates,
) -> Result<Vec<UpcomingLot>> {
    let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let filter = symbol_filter.map(|s| s.trim().to_uppercase());

    let mut upcoming = Vec::new();

    for security in db::get_all_securities(conn)? {
        if let Some(ref wanted) = filter {
            if &security.symbol != wanted {
                continue;
            }
        }

        let security_id = security.id.context("Security loaded without an id")?;
        let matcher = replay_security(conn, security_id, &security.symbol, as_of, rates)?;

        for lot in matcher.open_lots() {
            let days = (as_of - lot.acquired).num_days();
            let still_short = days <= rates.threshold_days;
            let close_enough = days > rates.threshold_days - within_days;

            if still_short && close_enough {
                upcoming.push(UpcomingLot {
                    symbol: security.symbol.clone(),
                    acquired: lot.acquired,
                    quantity: lot.quantity,
                    unit_cost: lot.unit_cost,
                    holding_days: days,
                    days_to_long_term: rates.threshold_days + 1 - days,
                });
            }
        }
    }

    Ok(upcoming
        .into_iter()
        .sorted_by_key(|l| (l.days_to_long_term, l.symbol.clone()))
        .collect())
}
