//! FIFO lot matcher - the core of the ledger
//!
//! Each security carries an ordered queue of open purchase lots. Buys
//! enqueue at the tail; sells consume from the head, oldest lot first,
//! splitting the last touched lot when only part of it is needed. Every
//! matched slice produces one realized gain record, classified short- or
//! long-term by holding period and taxed at the corresponding flat rate.
//!
//! Invariants:
//! - the sum of remaining lot quantities always equals total bought minus
//!   total sold for the security
//! - no lot quantity ever goes negative
//! - an oversell fails with `InsufficientHoldings` and leaves the queue
//!   untouched

use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::classify::{HoldingTerm, TaxRates};
use crate::db::{Transaction, TransactionAction};
use crate::error::LedgerError;

/// An open purchase lot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lot {
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub acquired: NaiveDate,
}

impl Lot {
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

/// One matched slice of a sale: a single lot (or part of one) closed
/// against a sell transaction
#[derive(Debug, Clone, Serialize)]
pub struct RealizedGain {
    pub symbol: String,
    pub sale_date: NaiveDate,
    pub acquired: NaiveDate,
    pub quantity: Decimal,
    /// quantity x sale price, before the sale-level fee
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub gain: Decimal,
    pub holding_days: i64,
    pub term: HoldingTerm,
    pub tax: Decimal,
}

/// Full result of matching one sell transaction
///
/// The flat brokerage fee is charged once per sale: it reduces the
/// sale-level proceeds and net gain but is never allocated to the per-lot
/// records, whose gains and taxes are computed on undiminished proceeds.
#[derive(Debug, Clone, Serialize)]
pub struct SaleRealization {
    pub symbol: String,
    pub sale_date: NaiveDate,
    pub quantity: Decimal,
    pub gross_proceeds: Decimal,
    pub fee: Decimal,
    pub net_proceeds: Decimal,
    /// Sum of per-lot gains, before the fee
    pub total_gain: Decimal,
    /// total_gain minus the sale fee
    pub net_gain: Decimal,
    pub total_tax: Decimal,
    pub records: Vec<RealizedGain>,
}

/// FIFO matcher for a single security
#[derive(Debug)]
pub struct FifoMatcher {
    symbol: String,
    lots: VecDeque<Lot>,
}

impl FifoMatcher {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            lots: VecDeque::new(),
        }
    }

    /// Enqueue a purchase as a new lot at the tail. Non-buy transactions
    /// are ignored.
    pub fn add_purchase(&mut self, tx: &Transaction) {
        if tx.action != TransactionAction::Buy {
            return;
        }

        self.lots.push_back(Lot {
            quantity: tx.quantity,
            unit_cost: tx.price_per_unit,
            acquired: tx.trade_date,
        });
    }

    /// Match a sale against the open lots, oldest first.
    ///
    /// Fails with `InsufficientHoldings` before touching the queue when
    /// the sold quantity exceeds the total held quantity.
    pub fn match_sale(&mut self, tx: &Transaction, rates: &TaxRates) -> Result<SaleRealization> {
        if tx.action != TransactionAction::Sell {
            return Err(anyhow!("Transaction is not a sale"));
        }
        if tx.quantity <= Decimal::ZERO {
            return Err(anyhow!("Sale quantity must be positive"));
        }

        let available = self.held_quantity();
        if tx.quantity > available {
            return Err(LedgerError::InsufficientHoldings {
                symbol: self.symbol.clone(),
                requested: tx.quantity,
                available,
            }
            .into());
        }

        let mut remaining = tx.quantity;
        let mut records = Vec::new();
        let mut total_gain = Decimal::ZERO;
        let mut total_tax = Decimal::ZERO;

        while remaining > Decimal::ZERO {
            // The precheck guarantees the queue is non-empty here
            let lot = self
                .lots
                .front_mut()
                .ok_or_else(|| anyhow!("Lot queue exhausted mid-sale for {}", self.symbol))?;

            let matched = remaining.min(lot.quantity);
            let holding_days = (tx.trade_date - lot.acquired).num_days();
            let term = rates.classify(holding_days);

            let proceeds = matched * tx.price_per_unit;
            let cost_basis = matched * lot.unit_cost;
            let gain = proceeds - cost_basis;
            let tax = rates.tax_on(gain, term);

            records.push(RealizedGain {
                symbol: self.symbol.clone(),
                sale_date: tx.trade_date,
                acquired: lot.acquired,
                quantity: matched,
                proceeds,
                cost_basis,
                gain,
                holding_days,
                term,
                tax,
            });

            total_gain += gain;
            total_tax += tax;
            remaining -= matched;

            if matched == lot.quantity {
                self.lots.pop_front();
            } else {
                lot.quantity -= matched;
            }
        }

        let gross_proceeds = tx.quantity * tx.price_per_unit;

        Ok(SaleRealization {
            symbol: self.symbol.clone(),
            sale_date: tx.trade_date,
            quantity: tx.quantity,
            gross_proceeds,
            fee: tx.fee,
            net_proceeds: gross_proceeds - tx.fee,
            total_gain,
            net_gain: total_gain - tx.fee,
            total_tax,
            records,
        })
    }

    /// Total quantity across all open lots
    pub fn held_quantity(&self) -> Decimal {
        self.lots.iter().map(|l| l.quantity).sum()
    }

    /// Total cost basis across all open lots
    pub fn cost_basis(&self) -> Decimal {
        self.lots.iter().map(|l| l.cost_basis()).sum()
    }

    /// Open lots in queue order (oldest first)
    pub fn open_lots(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }
}
