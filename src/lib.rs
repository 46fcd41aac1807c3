//! Tradersan - personal portfolio tracker with FIFO lot accounting
//!
//! This library tracks stock purchases and sales in a local SQLite
//! ledger, matches sells against purchase lots oldest-first, and
//! classifies realized gains short- or long-term for tax reporting.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod importers;
pub mod reports;
pub mod tax;
pub mod utils;
