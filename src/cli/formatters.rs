//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use colored::Colorize;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::db::Transaction;
use crate::reports::{PortfolioReport, SecurityGainSummary, UpcomingLot};
use crate::tax::{AnnualGains, HoldingTerm};
use crate::utils::{format_currency, format_quantity};

fn json_or_error<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format a portfolio snapshot for JSON output
pub fn format_portfolio_json(report: &PortfolioReport) -> String {
    json_or_error(report)
}

/// Format a portfolio snapshot for terminal table output
pub fn format_portfolio_table(report: &PortfolioReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Portfolio as of {}\n\n",
        "📊".cyan().bold(),
        report.as_of
    ));

    if report.positions.is_empty() {
        output.push_str("No open positions.\n");
        return output;
    }

    #[derive(Tabled)]
    struct PositionRow {
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Shares")]
        shares: String,
        #[tabled(rename = "Avg Cost")]
        avg_cost: String,
        #[tabled(rename = "Cost Basis")]
        cost_basis: String,
        #[tabled(rename = "Avg Held (days)")]
        held_days: String,
        #[tabled(rename = "LT Shares")]
        lt_shares: String,
        #[tabled(rename = "LT Cost")]
        lt_cost: String,
    }

    let rows: Vec<PositionRow> = report
        .positions
        .iter()
        .map(|p| PositionRow {
            symbol: p.symbol.clone(),
            shares: format_quantity(p.shares),
            avg_cost: format_currency(p.average_cost),
            cost_basis: format_currency(p.cost_basis),
            held_days: p.weighted_holding_days.to_string(),
            lt_shares: format_quantity(p.long_term_shares),
            lt_cost: format_currency(p.long_term_cost),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!(
        "\n\n{:<20} {}\n",
        "Total Cost Basis:".bold(),
        format_currency(report.total_cost_basis)
    ));

    output
}

/// Format upcoming long-term lots for JSON output
pub fn format_lots_json(lots: &[UpcomingLot]) -> String {
    json_or_error(&lots)
}

/// Format upcoming long-term lots for terminal table output
pub fn format_lots_table(lots: &[UpcomingLot], within_days: i64) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Lots turning long-term within {} days\n\n",
        "⏳".cyan().bold(),
        within_days
    ));

    if lots.is_empty() {
        output.push_str("No lots are approaching the long-term threshold.\n");
        return output;
    }

    #[derive(Tabled)]
    struct LotRow {
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Acquired")]
        acquired: String,
        #[tabled(rename = "Shares")]
        shares: String,
        #[tabled(rename = "Unit Cost")]
        unit_cost: String,
        #[tabled(rename = "Held (days)")]
        held: String,
        #[tabled(rename = "Long-Term In")]
        days_left: String,
    }

    let rows: Vec<LotRow> = lots
        .iter()
        .map(|l| LotRow {
            symbol: l.symbol.clone(),
            acquired: l.acquired.to_string(),
            shares: format_quantity(l.quantity),
            unit_cost: format_currency(l.unit_cost),
            held: l.holding_days.to_string(),
            days_left: format!("{} days", l.days_to_long_term),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(2..), Alignment::right());
    output.push_str(&table.to_string());
    output.push('\n');

    output
}

/// Format the annual tax report for JSON output
pub fn format_tax_report_json(gains: &AnnualGains) -> String {
    json_or_error(gains)
}

/// Format the annual tax report for terminal table output
pub fn format_tax_report_table(gains: &AnnualGains) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Realized gains {}\n\n",
        "🧾".cyan().bold(),
        gains.year
    ));

    if gains.sales.is_empty() {
        output.push_str(&format!("No sales in {}.\n", gains.year));
        return output;
    }

    #[derive(Tabled)]
    struct RecordRow {
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Sold")]
        sold: String,
        #[tabled(rename = "Acquired")]
        acquired: String,
        #[tabled(rename = "Shares")]
        shares: String,
        #[tabled(rename = "Proceeds")]
        proceeds: String,
        #[tabled(rename = "Cost Basis")]
        cost_basis: String,
        #[tabled(rename = "Gain")]
        gain: String,
        #[tabled(rename = "Term")]
        term: String,
        #[tabled(rename = "Tax")]
        tax: String,
    }

    let rows: Vec<RecordRow> = gains
        .sales
        .iter()
        .flat_map(|sale| sale.records.iter())
        .map(|r| RecordRow {
            symbol: r.symbol.clone(),
            sold: r.sale_date.to_string(),
            acquired: r.acquired.to_string(),
            shares: format_quantity(r.quantity),
            proceeds: format_currency(r.proceeds),
            cost_basis: format_currency(r.cost_basis),
            gain: colorize_money(r.gain),
            term: match r.term {
                HoldingTerm::Short => "short".to_string(),
                HoldingTerm::Long => "long".to_string(),
            },
            tax: format_currency(r.tax),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(3..), Alignment::right());
    output.push_str(&table.to_string());

    let totals = &gains.totals;
    output.push_str(&format!("\n\n{} Totals", "━".repeat(60).bright_black()));
    output.push_str(&format!(
        "\n{:<24} {}",
        "Short-term gain:".bold(),
        colorize_money(totals.short_term_gain)
    ));
    output.push_str(&format!(
        "\n{:<24} {}",
        "Short-term tax:".bold(),
        format_currency(totals.short_term_tax)
    ));
    output.push_str(&format!(
        "\n{:<24} {}",
        "Long-term gain:".bold(),
        colorize_money(totals.long_term_gain)
    ));
    output.push_str(&format!(
        "\n{:<24} {}",
        "Long-term tax:".bold(),
        format_currency(totals.long_term_tax)
    ));
    output.push_str(&format!(
        "\n{:<24} {}",
        "Fees:".bold(),
        format_currency(totals.fees)
    ));
    output.push_str(&format!(
        "\n{:<24} {}",
        "Net gain (after fees):".bold(),
        colorize_money(totals.net_gain)
    ));
    output.push_str(&format!(
        "\n{:<24} {}\n",
        "Total tax due:".bold(),
        format_currency(totals.total_tax)
    ));

    output
}

/// Format the per-security tax summary for JSON output
pub fn format_tax_summary_json(year: i32, summary: &[SecurityGainSummary]) -> String {
    #[derive(serde::Serialize)]
    struct JsonSummary<'a> {
        year: i32,
        securities: &'a [SecurityGainSummary],
    }

    json_or_error(&JsonSummary {
        year,
        securities: summary,
    })
}

/// Format the per-security tax summary for terminal table output
pub fn format_tax_summary_table(year: i32, summary: &[SecurityGainSummary]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Realized gains by security, {}\n\n",
        "🧾".cyan().bold(),
        year
    ));

    if summary.is_empty() {
        output.push_str(&format!("No sales in {}.\n", year));
        return output;
    }

    #[derive(Tabled)]
    struct SummaryRow {
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Proceeds")]
        proceeds: String,
        #[tabled(rename = "Cost Basis")]
        cost_basis: String,
        #[tabled(rename = "ST Gain")]
        st_gain: String,
        #[tabled(rename = "LT Gain")]
        lt_gain: String,
        #[tabled(rename = "Fees")]
        fees: String,
        #[tabled(rename = "Net Gain")]
        net_gain: String,
        #[tabled(rename = "Tax")]
        tax: String,
    }

    let rows: Vec<SummaryRow> = summary
        .iter()
        .map(|s| SummaryRow {
            symbol: s.symbol.clone(),
            proceeds: format_currency(s.proceeds),
            cost_basis: format_currency(s.cost_basis),
            st_gain: colorize_money(s.short_term_gain),
            lt_gain: colorize_money(s.long_term_gain),
            fees: format_currency(s.fees),
            net_gain: colorize_money(s.net_gain),
            tax: format_currency(s.total_tax),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());
    output.push('\n');

    output
}

/// Format a transaction listing for JSON output
pub fn format_transactions_json(transactions: &[(String, Transaction)]) -> String {
    #[derive(serde::Serialize)]
    struct JsonTx<'a> {
        symbol: &'a str,
        #[serde(flatten)]
        transaction: &'a Transaction,
    }

    let rows: Vec<JsonTx> = transactions
        .iter()
        .map(|(symbol, tx)| JsonTx {
            symbol,
            transaction: tx,
        })
        .collect();

    json_or_error(&rows)
}

/// Format a transaction listing for terminal table output
pub fn format_transactions_table(transactions: &[(String, Transaction)]) -> String {
    let mut output = String::new();

    if transactions.is_empty() {
        output.push_str("No transactions recorded.\n");
        return output;
    }

    #[derive(Tabled)]
    struct TxRow {
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
        #[tabled(rename = "Source")]
        source: String,
    }

    let rows: Vec<TxRow> = transactions
        .iter()
        .map(|(symbol, tx)| TxRow {
            date: tx.trade_date.to_string(),
            symbol: symbol.clone(),
            action: tx.action.as_str().to_string(),
            shares: format_quantity(tx.quantity),
            price: format_currency(tx.price_per_unit),
            fee: format_currency(tx.fee),
            source: tx.source.clone(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(3..), Alignment::right());
    output.push_str(&table.to_string());
    output.push('\n');

    output
}

fn colorize_money(value: Decimal) -> String {
    let text = format_currency(value);
    if value >= Decimal::ZERO {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}
