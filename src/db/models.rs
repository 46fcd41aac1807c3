use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A tracked security (stock, ETF, fund share)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub id: Option<i64>,
    pub symbol: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Transaction action (buy or sell)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionAction {
    Buy,
    Sell,
}

impl TransactionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionAction::Buy => "BUY",
            TransactionAction::Sell => "SELL",
        }
    }
}

impl FromStr for TransactionAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "B" => Ok(TransactionAction::Buy),
            "SELL" | "S" => Ok(TransactionAction::Sell),
            _ => Err(()),
        }
    }
}

/// Transaction (buy or sell of a security)
///
/// The transaction log is the source of truth; open lots and realized
/// gains are always derived by replaying it in date order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<i64>,
    pub security_id: i64,
    pub action: TransactionAction,
    pub trade_date: NaiveDate,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
    /// Gross amount (quantity x price), before fees
    pub amount: Decimal,
    /// Flat brokerage fee; zero for buys
    pub fee: Decimal,
    pub account: Option<String>,
    pub source: String, // 'SCHWAB', 'MARCUS', 'MANUAL'
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a manual transaction with the gross amount derived from
    /// quantity and price.
    pub fn manual(
        security_id: i64,
        action: TransactionAction,
        trade_date: NaiveDate,
        quantity: Decimal,
        price_per_unit: Decimal,
        fee: Decimal,
        account: Option<String>,
    ) -> Self {
        Self {
            id: None,
            security_id,
            action,
            trade_date,
            quantity,
            price_per_unit,
            amount: quantity * price_per_unit,
            fee,
            account,
            source: "MANUAL".to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_action_round_trip() {
        assert_eq!("BUY".parse::<TransactionAction>(), Ok(TransactionAction::Buy));
        assert_eq!("sell".parse::<TransactionAction>(), Ok(TransactionAction::Sell));
        assert_eq!("B".parse::<TransactionAction>(), Ok(TransactionAction::Buy));
        assert_eq!("S".parse::<TransactionAction>(), Ok(TransactionAction::Sell));
        assert!("DIVIDEND".parse::<TransactionAction>().is_err());
        assert_eq!(TransactionAction::Buy.as_str(), "BUY");
    }

    #[test]
    fn test_manual_transaction_derives_amount() {
        let tx = Transaction::manual(
            1,
            TransactionAction::Buy,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            dec!(10),
            dec!(5.25),
            Decimal::ZERO,
            None,
        );
        assert_eq!(tx.amount, dec!(52.50));
        assert_eq!(tx.source, "MANUAL");
    }
}
