// Reports module - portfolio snapshot and realized gains generators

pub mod gains;
pub mod portfolio;

pub use gains::{summarize_by_security, SecurityGainSummary};
pub use portfolio::{
    portfolio_report, upcoming_long_term_lots, PortfolioReport, PositionSummary, UpcomingLot,
};
