//! Deepest-pool price discovery against the reference and display currencies.

use crate::datasource::ChainSource;
use crate::domain::{pow10, Address, Decimal, Slot0, U256};
use crate::orchestration::ledger::LedgerError;
use alloy_primitives::U512;
use std::sync::Arc;

/// Default fee tiers scanned for a pair, in hundredths of a basis point.
pub const DEFAULT_FEE_TIERS: [u32; 3] = [500, 3_000, 10_000];

/// Immutable pricing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    /// Token every value is first expressed in (wrapped ETH).
    pub reference_token: Address,
    /// Token the display currency is read from (a USD stablecoin).
    pub display_token: Address,
    /// Fee tiers scanned, in order.
    pub fee_tiers: Vec<u32>,
}

impl OracleConfig {
    pub fn new(reference_token: Address, display_token: Address) -> Self {
        Self {
            reference_token,
            display_token,
            fee_tiers: DEFAULT_FEE_TIERS.to_vec(),
        }
    }
}

/// Decode a pool's sqrt price into `(price0, price1)`.
///
/// `price0` is token1 per whole token0, `price1` its inverse. Both are exact
/// rationals truncated to 28 significant digits; a side that cannot be
/// represented (zero price, or a quotient too wide) decodes as zero.
pub fn pool_prices(sqrt_price_x96: U256, decimals0: u8, decimals1: u8) -> (Decimal, Decimal) {
    let squared = U512::from(sqrt_price_x96) * U512::from(sqrt_price_x96);
    let q192: U512 = U512::from(1u64) << 192;

    let scale0 = pow10(u32::from(decimals0));
    let scale1 = pow10(u32::from(decimals1));

    let (Some(num), Some(den)) = (squared.checked_mul(scale0), q192.checked_mul(scale1)) else {
        return (Decimal::zero(), Decimal::zero());
    };

    let price0 = Decimal::from_ratio(num, den).unwrap_or_default();
    let price1 = Decimal::from_ratio(den, num).unwrap_or_default();
    (price0, price1)
}

/// Prices tokens from the deepest pool among the configured fee tiers.
#[derive(Debug, Clone)]
pub struct PriceOracle {
    chain: Arc<dyn ChainSource>,
    config: OracleConfig,
}

impl PriceOracle {
    pub fn new(chain: Arc<dyn ChainSource>, config: OracleConfig) -> Self {
        Self { chain, config }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Price of one whole `token` in the reference currency; zero when no
    /// usable pool exists.
    pub async fn price_in_reference(&self, token: Address) -> Result<Decimal, LedgerError> {
        self.price_of(token, self.config.reference_token).await
    }

    /// Price of one whole reference token in the display currency; zero when
    /// no usable pool exists.
    pub async fn price_reference_in_display(&self) -> Result<Decimal, LedgerError> {
        self.price_of(self.config.reference_token, self.config.display_token)
            .await
    }

    pub async fn require_price_in_reference(&self, token: Address) -> Result<Decimal, LedgerError> {
        let price = self.price_in_reference(token).await?;
        if price.is_zero() {
            return Err(LedgerError::UnpriceableToken(token));
        }
        Ok(price)
    }

    pub async fn require_reference_in_display(&self) -> Result<Decimal, LedgerError> {
        let price = self.price_reference_in_display().await?;
        if price.is_zero() {
            return Err(LedgerError::UnpriceableToken(self.config.display_token));
        }
        Ok(price)
    }

    /// Units of `quote` per whole `base`.
    async fn price_of(&self, base: Address, quote: Address) -> Result<Decimal, LedgerError> {
        if base == quote {
            return Ok(Decimal::one());
        }

        let Some(slot0) = self.deepest_pool(base, quote).await else {
            tracing::debug!(%base, %quote, "no usable pool in any fee tier");
            return Ok(Decimal::zero());
        };

        let (token0, token1) = if base < quote { (base, quote) } else { (quote, base) };
        let decimals0 = self.decimals(token0).await?;
        let decimals1 = self.decimals(token1).await?;

        let (price0, price1) = pool_prices(slot0.sqrt_price_x96, decimals0, decimals1);
        Ok(if base == token0 { price0 } else { price1 })
    }

    /// Slot0 of the pool with strictly the largest liquidity across fee tiers.
    async fn deepest_pool(&self, token_a: Address, token_b: Address) -> Option<Slot0> {
        let mut best_liquidity = 0u128;
        let mut best = None;

        for &fee in &self.config.fee_tiers {
            let pool = match self.chain.pool_address(token_a, token_b, fee).await {
                Ok(Some(pool)) => pool,
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!(fee, error = %err, "pool lookup failed, skipping tier");
                    continue;
                }
            };

            let liquidity = match self.chain.liquidity(pool).await {
                Ok(liquidity) => liquidity,
                Err(err) => {
                    tracing::debug!(%pool, fee, error = %err, "liquidity read failed, skipping tier");
                    continue;
                }
            };
            if liquidity <= best_liquidity {
                continue;
            }

            match self.chain.slot0(pool).await {
                Ok(slot0) => {
                    best_liquidity = liquidity;
                    best = Some(slot0);
                }
                Err(err) => {
                    tracing::debug!(%pool, fee, error = %err, "slot0 read failed, skipping tier");
                }
            }
        }

        best
    }

    async fn decimals(&self, token: Address) -> Result<u8, LedgerError> {
        token_decimals(self.chain.as_ref(), token).await
    }
}

/// Read a token's decimals, logging the token when the read fails.
pub(crate) async fn token_decimals(
    chain: &dyn ChainSource,
    token: Address,
) -> Result<u8, LedgerError> {
    chain.decimals(token).await.map_err(|err| {
        tracing::warn!(%token, error = %err, "token decimals unavailable");
        LedgerError::UnresolvableDecimals(token)
    })
}
