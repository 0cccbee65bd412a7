//! In-memory chain source for tests and local runs.

use super::{ChainSource, ChainSourceError};
use crate::domain::{Address, FundId, PositionInfo, Slot0, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MockState {
    symbols: HashMap<Address, String>,
    decimals: HashMap<Address, u8>,
    pools: HashMap<(Address, Address, u32), Address>,
    liquidity: HashMap<Address, u128>,
    slot0: HashMap<Address, Slot0>,
    positions: HashMap<U256, PositionInfo>,
    fund_balances: HashMap<(FundId, Address), U256>,
    investor_balances: HashMap<(FundId, Address, Address), U256>,
    investor_positions: HashMap<(FundId, Address), Vec<U256>>,
}

fn pair_key(token_a: Address, token_b: Address, fee: u32) -> (Address, Address, u32) {
    if token_a < token_b {
        (token_a, token_b, fee)
    } else {
        (token_b, token_a, fee)
    }
}

/// Mock chain source whose state can be changed between events.
///
/// Unknown pools/positions and missing metadata behave like reverted calls;
/// unknown balances read as zero.
#[derive(Debug, Default)]
pub struct MockChainSource {
    state: Mutex<MockState>,
}

impl MockChainSource {
    /// Create a new mock chain source with no contracts.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register ERC-20 metadata.
    pub fn with_token(self, token: Address, symbol: &str, decimals: u8) -> Self {
        self.set_token(token, symbol, decimals);
        self
    }

    pub fn set_token(&self, token: Address, symbol: &str, decimals: u8) {
        let mut state = self.state();
        state.symbols.insert(token, symbol.to_string());
        state.decimals.insert(token, decimals);
    }

    /// Register a pool and its state.
    pub fn with_pool(
        self,
        token_a: Address,
        token_b: Address,
        fee: u32,
        pool: Address,
        liquidity: u128,
        slot0: Slot0,
    ) -> Self {
        self.set_pool(token_a, token_b, fee, pool, liquidity, slot0);
        self
    }

    pub fn set_pool(
        &self,
        token_a: Address,
        token_b: Address,
        fee: u32,
        pool: Address,
        liquidity: u128,
        slot0: Slot0,
    ) {
        let mut state = self.state();
        state.pools.insert(pair_key(token_a, token_b, fee), pool);
        state.liquidity.insert(pool, liquidity);
        state.slot0.insert(pool, slot0);
    }

    /// Update the price of an already registered pool.
    pub fn set_slot0(&self, pool: Address, slot0: Slot0) {
        self.state().slot0.insert(pool, slot0);
    }

    /// Register a pool address whose state reads revert.
    pub fn with_broken_pool(self, token_a: Address, token_b: Address, fee: u32, pool: Address) -> Self {
        self.state().pools.insert(pair_key(token_a, token_b, fee), pool);
        self
    }

    pub fn set_position(&self, token_id: U256, position: PositionInfo) {
        self.state().positions.insert(token_id, position);
    }

    pub fn set_fund_balance(&self, fund_id: FundId, token: Address, amount: U256) {
        self.state().fund_balances.insert((fund_id, token), amount);
    }

    pub fn set_investor_balance(&self, fund_id: FundId, investor: Address, token: Address, amount: U256) {
        self.state()
            .investor_balances
            .insert((fund_id, investor, token), amount);
    }

    pub fn set_investor_positions(&self, fund_id: FundId, investor: Address, token_ids: Vec<U256>) {
        self.state()
            .investor_positions
            .insert((fund_id, investor), token_ids);
    }
}

#[async_trait]
impl ChainSource for MockChainSource {
    async fn symbol(&self, token: Address) -> Result<String, ChainSourceError> {
        self.state()
            .symbols
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainSourceError::Reverted(format!("symbol() on {}", token)))
    }

    async fn decimals(&self, token: Address) -> Result<u8, ChainSourceError> {
        self.state()
            .decimals
            .get(&token)
            .copied()
            .ok_or_else(|| ChainSourceError::Reverted(format!("decimals() on {}", token)))
    }

    async fn pool_address(
        &self,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> Result<Option<Address>, ChainSourceError> {
        Ok(self
            .state()
            .pools
            .get(&pair_key(token_a, token_b, fee))
            .copied())
    }

    async fn liquidity(&self, pool: Address) -> Result<u128, ChainSourceError> {
        self.state()
            .liquidity
            .get(&pool)
            .copied()
            .ok_or_else(|| ChainSourceError::Reverted(format!("liquidity() on {}", pool)))
    }

    async fn slot0(&self, pool: Address) -> Result<Slot0, ChainSourceError> {
        self.state()
            .slot0
            .get(&pool)
            .copied()
            .ok_or_else(|| ChainSourceError::Reverted(format!("slot0() on {}", pool)))
    }

    async fn position(&self, token_id: U256) -> Result<PositionInfo, ChainSourceError> {
        self.state()
            .positions
            .get(&token_id)
            .copied()
            .ok_or_else(|| ChainSourceError::NotFound(format!("position {}", token_id)))
    }

    async fn fund_token_balance(
        &self,
        fund_id: FundId,
        token: Address,
    ) -> Result<U256, ChainSourceError> {
        Ok(self
            .state()
            .fund_balances
            .get(&(fund_id, token))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn investor_token_balance(
        &self,
        fund_id: FundId,
        investor: Address,
        token: Address,
    ) -> Result<U256, ChainSourceError> {
        Ok(self
            .state()
            .investor_balances
            .get(&(fund_id, investor, token))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn investor_position_ids(
        &self,
        fund_id: FundId,
        investor: Address,
    ) -> Result<Vec<U256>, ChainSourceError> {
        Ok(self
            .state()
            .investor_positions
            .get(&(fund_id, investor))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const WETH: Address = address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    const USDC: Address = address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    const POOL: Address = address!("0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640");

    fn slot0() -> Slot0 {
        Slot0 {
            sqrt_price_x96: U256::from(1u64) << 96,
            tick: 0,
        }
    }

    #[tokio::test]
    async fn test_pool_lookup_ignores_token_order() {
        let mock = MockChainSource::new().with_pool(WETH, USDC, 500, POOL, 42, slot0());
        assert_eq!(mock.pool_address(USDC, WETH, 500).await.unwrap(), Some(POOL));
        assert_eq!(mock.pool_address(WETH, USDC, 500).await.unwrap(), Some(POOL));
        assert_eq!(mock.pool_address(WETH, USDC, 3000).await.unwrap(), None);
        assert_eq!(mock.liquidity(POOL).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_broken_pool_reverts() {
        let mock = MockChainSource::new().with_broken_pool(WETH, USDC, 500, POOL);
        assert_eq!(mock.pool_address(WETH, USDC, 500).await.unwrap(), Some(POOL));
        assert!(mock.liquidity(POOL).await.is_err());
        assert!(mock.slot0(POOL).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_metadata_reverts_and_balances_default_to_zero() {
        let mock = MockChainSource::new().with_token(WETH, "WETH", 18);
        assert_eq!(mock.decimals(WETH).await.unwrap(), 18);
        assert!(mock.decimals(USDC).await.is_err());
        assert_eq!(
            mock.fund_token_balance(FundId::new(1), WETH).await.unwrap(),
            U256::ZERO
        );

        mock.set_fund_balance(FundId::new(1), WETH, U256::from(5u64));
        assert_eq!(
            mock.fund_token_balance(FundId::new(1), WETH).await.unwrap(),
            U256::from(5u64)
        );
    }
}
