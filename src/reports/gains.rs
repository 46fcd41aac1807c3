//! Per-security aggregation of realized gains
//!
//! The annual tax report lists every realized gain record; the summary
//! view folds those into one row per security.

use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::tax::{AnnualGains, GainTotals};

/// Realized gains for one security over a year
#[derive(Debug, Clone, Serialize)]
pub struct SecurityGainSummary {
    pub symbol: String,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub short_term_gain: Decimal,
    pub short_term_tax: Decimal,
    pub long_term_gain: Decimal,
    pub long_term_tax: Decimal,
    pub fees: Decimal,
    pub net_gain: Decimal,
    pub total_tax: Decimal,
}

/// Fold an annual report into one summary row per security
pub fn summarize_by_security(gains: &AnnualGains) -> Vec<SecurityGainSummary> {
    gains
        .sales
        .iter()
        .sorted_by(|a, b| a.symbol.cmp(&b.symbol))
        .chunk_by(|sale| sale.symbol.clone())
        .into_iter()
        .map(|(symbol, sales)| {
            let mut totals = GainTotals::default();
            for sale in sales {
                totals.accumulate(sale);
            }
            SecurityGainSummary {
                symbol,
                proceeds: totals.proceeds,
                cost_basis: totals.cost_basis,
                short_term_gain: totals.short_term_gain,
                short_term_tax: totals.short_term_tax,
                long_term_gain: totals.long_term_gain,
                long_term_tax: totals.long_term_tax,
                fees: totals.fees,
                net_gain: totals.net_gain,
                total_tax: totals.total_tax,
            }
        })
        .collect()
}
