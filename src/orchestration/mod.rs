//! Chain-facing layer: pricing, holdings refresh and event handling.

pub mod ledger;
pub mod price_oracle;
pub mod valuation;

pub use ledger::{AccountingEngine, LedgerError, Outcome};
pub use price_oracle::{pool_prices, OracleConfig, PriceOracle, DEFAULT_FEE_TIERS};
pub use valuation::{pooled_value, refresh_fund_current_value, refresh_investor_holdings, PriceBook};
