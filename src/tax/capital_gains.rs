//! Annual capital gains calculation
//!
//! Replays each security's full transaction history through the FIFO
//! matcher and collects the realizations for sells that settled in the
//! requested year. Earlier sells still have to be matched so the lot
//! queues are in the right state when the year begins.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::classify::{HoldingTerm, TaxRates};
use super::fifo::{FifoMatcher, SaleRealization};
use crate::db::{self, TransactionAction};

/// Aggregate totals over a set of sale realizations
#[derive(Debug, Clone, Default, Serialize)]
pub struct GainTotals {
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub short_term_gain: Decimal,
    pub short_term_tax: Decimal,
    pub long_term_gain: Decimal,
    pub long_term_tax: Decimal,
    pub fees: Decimal,
    pub total_tax: Decimal,
    pub net_gain: Decimal,
}

impl GainTotals {
    pub fn accumulate(&mut self, sale: &SaleRealization) {
        self.proceeds += sale.gross_proceeds;
        self.fees += sale.fee;
        self.total_tax += sale.total_tax;
        self.net_gain += sale.net_gain;

        for record in &sale.records {
            self.cost_basis += record.cost_basis;
            match record.term {
                HoldingTerm::Short => {
                    self.short_term_gain += record.gain;
                    self.short_term_tax += record.tax;
                }
                HoldingTerm::Long => {
                    self.long_term_gain += record.gain;
                    self.long_term_tax += record.tax;
                }
            }
        }
    }
}

/// Realized gains for one calendar year
#[derive(Debug, Serialize)]
pub struct AnnualGains {
    pub year: i32,
    pub sales: Vec<SaleRealization>,
    pub totals: GainTotals,
}

/// Calculate realized capital gains for every sale in the given year
pub fn calculate_annual_gains(
    conn: &Connection,
    year: i32,
    rates: &TaxRates,
) -> Result<AnnualGains> {
    info!("Calculating realized gains for {}", year);

    let year_start = NaiveDate::from_ymd_opt(year, 1, 1)
        .context(format!("Invalid year: {}", year))?;
    let year_end = NaiveDate::from_ymd_opt(year, 12, 31)
        .context(format!("Invalid year: {}", year))?;

    let mut sales = Vec::new();
    let mut totals = GainTotals::default();

    for security in db::get_all_securities(conn)? {
        let security_id = security
            .id
            .context("Security loaded without an id")?;
        let transactions = db::get_security_transactions(conn, security_id, Some(year_end))?;

        let mut matcher = FifoMatcher::new(security.symbol.clone());

        for tx in &transactions {
            match tx.action {
                TransactionAction::Buy => matcher.add_purchase(tx),
                TransactionAction::Sell => {
                    let sale = matcher.match_sale(tx, rates).context(format!(
                        "Failed to match sale of {} on {}",
                        security.symbol, tx.trade_date
                    ))?;

                    if tx.trade_date >= year_start {
                        totals.accumulate(&sale);
                        sales.push(sale);
                    }
                }
            }
        }
    }

    sales.sort_by(|a, b| (a.sale_date, a.symbol.clone()).cmp(&(b.sale_date, b.symbol.clone())));

    Ok(AnnualGains {
        year,
        sales,
        totals,
    })
}
