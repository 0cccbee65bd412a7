//! Chain read abstraction: token metadata, pool state, positions and fund balances.

use crate::domain::{Address, FundId, PositionInfo, Slot0, U256};
use async_trait::async_trait;
use std::fmt;

pub mod mock;

pub use mock::MockChainSource;

/// Symbol recorded for tokens whose `symbol()` call fails.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Read-only view of on-chain state needed for valuation.
///
/// Every call may fail (a reverted or unreadable contract call); callers
/// decide whether a failure skips work or aborts the current update.
#[async_trait]
pub trait ChainSource: Send + Sync + fmt::Debug {
    /// ERC-20 `symbol()`.
    async fn symbol(&self, token: Address) -> Result<String, ChainSourceError>;

    /// ERC-20 `decimals()`.
    async fn decimals(&self, token: Address) -> Result<u8, ChainSourceError>;

    /// Pool registered for an unordered token pair and fee tier, if any.
    async fn pool_address(
        &self,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> Result<Option<Address>, ChainSourceError>;

    /// In-range liquidity of a pool.
    async fn liquidity(&self, pool: Address) -> Result<u128, ChainSourceError>;

    /// Current sqrt price and tick of a pool.
    async fn slot0(&self, pool: Address) -> Result<Slot0, ChainSourceError>;

    /// Liquidity position by token id.
    async fn position(&self, token_id: U256) -> Result<PositionInfo, ChainSourceError>;

    /// Raw balance of `token` held by a fund.
    async fn fund_token_balance(
        &self,
        fund_id: FundId,
        token: Address,
    ) -> Result<U256, ChainSourceError>;

    /// Raw balance of `token` attributed to one investor inside a fund.
    async fn investor_token_balance(
        &self,
        fund_id: FundId,
        investor: Address,
        token: Address,
    ) -> Result<U256, ChainSourceError>;

    /// Ids of the liquidity positions an investor holds through a fund.
    async fn investor_position_ids(
        &self,
        fund_id: FundId,
        investor: Address,
    ) -> Result<Vec<U256>, ChainSourceError>;
}

/// Symbol of a token, or [`UNKNOWN_SYMBOL`] when the call fails.
pub async fn symbol_or_unknown(chain: &dyn ChainSource, token: Address) -> String {
    match chain.symbol(token).await {
        Ok(symbol) => symbol,
        Err(err) => {
            tracing::debug!(%token, error = %err, "symbol() failed, using fallback");
            UNKNOWN_SYMBOL.to_string()
        }
    }
}

/// Error type for chain reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSourceError {
    /// The contract call reverted.
    Reverted(String),
    /// The queried contract or record does not exist.
    NotFound(String),
    /// Transport or decoding failure.
    Other(String),
}

impl fmt::Display for ChainSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainSourceError::Reverted(msg) => write!(f, "Call reverted: {}", msg),
            ChainSourceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ChainSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for ChainSourceError {}
