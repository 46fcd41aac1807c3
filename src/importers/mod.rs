// Import module - broker CSV export parsers

pub mod file_detector;
pub mod marcus_csv;
pub mod schwab_csv;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::db::{Transaction, TransactionAction};
pub use file_detector::detect_broker;

/// Supported broker export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broker {
    Schwab,
    Marcus,
}

impl Broker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Broker::Schwab => "SCHWAB",
            Broker::Marcus => "MARCUS",
        }
    }
}

impl FromStr for Broker {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schwab" => Ok(Broker::Schwab),
            "marcus" => Ok(Broker::Marcus),
            _ => Err(()),
        }
    }
}

/// A buy/sell row extracted from a broker export, before it is attached
/// to a security in the database
#[derive(Debug, Clone)]
pub struct RawTrade {
    pub symbol: String,
    pub action: TransactionAction,
    pub trade_date: NaiveDate,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Gross amount as reported by the broker (absolute value)
    pub amount: Decimal,
    pub fee: Decimal,
}

impl RawTrade {
    /// Convert to a database transaction once the security id is known
    pub fn to_transaction(
        &self,
        security_id: i64,
        account: Option<String>,
        broker: Broker,
    ) -> Transaction {
        Transaction {
            id: None,
            security_id,
            action: self.action,
            trade_date: self.trade_date,
            quantity: self.quantity,
            price_per_unit: self.price,
            amount: self.amount,
            fee: self.fee,
            account,
            source: broker.as_str().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Import trades from a broker CSV export
///
/// When `broker` is None the format is auto-detected from the header row.
/// Returns the broker that was used together with the parsed trades.
pub fn import_file<P: AsRef<Path>>(
    path: P,
    broker: Option<Broker>,
) -> Result<(Broker, Vec<RawTrade>)> {
    let path = path.as_ref();
    let broker = match broker {
        Some(b) => b,
        None => detect_broker(path)?,
    };

    info!("Importing {:?} as {} export", path, broker.as_str());

    let trades = match broker {
        Broker::Schwab => schwab_csv::parse_schwab_csv(path)?,
        Broker::Marcus => marcus_csv::parse_marcus_csv(path)?,
    };

    Ok((broker, trades))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_broker_parse_round_trip() {
        assert_eq!("schwab".parse::<Broker>(), Ok(Broker::Schwab));
        assert_eq!("MARCUS".parse::<Broker>(), Ok(Broker::Marcus));
        assert!("etrade".parse::<Broker>().is_err());
    }

    #[test]
    fn test_raw_trade_to_transaction_tags_source() {
        let raw = RawTrade {
            symbol: "AAPL".to_string(),
            action: TransactionAction::Buy,
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            quantity: dec!(10),
            price: dec!(185.50),
            amount: dec!(1855),
            fee: Decimal::ZERO,
        };

        let tx = raw.to_transaction(7, Some("schb576".to_string()), Broker::Schwab);
        assert_eq!(tx.security_id, 7);
        assert_eq!(tx.source, "SCHWAB");
        assert_eq!(tx.account.as_deref(), Some("schb576"));
        assert_eq!(tx.amount, dec!(1855));
    }
}
