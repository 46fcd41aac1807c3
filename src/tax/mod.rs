// Tax module - FIFO lot matching and capital gains classification

pub mod capital_gains;
pub mod classify;
pub mod fifo;

pub use capital_gains::{calculate_annual_gains, AnnualGains, GainTotals};
pub use classify::{HoldingTerm, TaxRates};
pub use fifo::{FifoMatcher, Lot, RealizedGain, SaleRealization};
