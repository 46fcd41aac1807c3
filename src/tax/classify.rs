//! Holding-period classification and tax rate lookup
//!
//! A matched lot is short-term when held for the threshold number of days
//! or fewer (365 by default: day 365 is still short-term, day 366 is
//! long-term), mirroring the one-year capital gains boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{Config, DAYS_IN_A_YEAR};

/// Short- vs long-term classification of a realized gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoldingTerm {
    Short,
    Long,
}

impl HoldingTerm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoldingTerm::Short => "SHORT",
            HoldingTerm::Long => "LONG",
        }
    }
}

/// Tax rates and the holding-period threshold applied to realized gains
#[derive(Debug, Clone)]
pub struct TaxRates {
    pub short_term: Decimal,
    pub long_term: Decimal,
    pub threshold_days: i64,
}

impl Default for TaxRates {
    fn default() -> Self {
        let config = Config::default();
        Self {
            short_term: config.short_term_rate,
            long_term: config.long_term_rate,
            threshold_days: DAYS_IN_A_YEAR,
        }
    }
}

impl From<&Config> for TaxRates {
    fn from(config: &Config) -> Self {
        Self {
            short_term: config.short_term_rate,
            long_term: config.long_term_rate,
            threshold_days: config.long_term_threshold_days,
        }
    }
}

impl TaxRates {
    /// Classify a holding period in whole days
    pub fn classify(&self, holding_days: i64) -> HoldingTerm {
        if holding_days > self.threshold_days {
            HoldingTerm::Long
        } else {
            HoldingTerm::Short
        }
    }

    /// Tax due on a realized gain. Losses bear no tax and generate no
    /// credit in this simplified model.
    pub fn tax_on(&self, gain: Decimal, term: HoldingTerm) -> Decimal {
        if gain <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let rate = match term {
            HoldingTerm::Short => self.short_term,
            HoldingTerm::Long => self.long_term,
        };
        gain * rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_boundary_day_365_is_short_term() {
        let rates = TaxRates::default();
        assert_eq!(rates.classify(365), HoldingTerm::Short);
    }

    #[test]
    fn test_boundary_day_366_is_long_term() {
        let rates = TaxRates::default();
        assert_eq!(rates.classify(366), HoldingTerm::Long);
    }

    #[test]
    fn test_same_day_sale_is_short_term() {
        let rates = TaxRates::default();
        assert_eq!(rates.classify(0), HoldingTerm::Short);
    }

    #[test]
    fn test_tax_rates_by_term() {
        let rates = TaxRates::default();
        assert_eq!(rates.tax_on(dec!(50), HoldingTerm::Long), dec!(7.50));
        assert_eq!(rates.tax_on(dec!(10), HoldingTerm::Short), dec!(4.00));
    }

    #[test]
    fn test_losses_bear_no_tax() {
        let rates = TaxRates::default();
        assert_eq!(rates.tax_on(dec!(-25), HoldingTerm::Short), Decimal::ZERO);
        assert_eq!(rates.tax_on(Decimal::ZERO, HoldingTerm::Long), Decimal::ZERO);
    }

    #[test]
    fn test_custom_threshold() {
        let rates = TaxRates {
            short_term: dec!(0.40),
            long_term: dec!(0.15),
            threshold_days: 180,
        };
        assert_eq!(rates.classify(180), HoldingTerm::Short);
        assert_eq!(rates.classify(181), HoldingTerm::Long);
    }
}
