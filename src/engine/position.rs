//! Splits a concentrated-liquidity position into its two token amounts.

use alloy_primitives::U256;

use super::sqrt_price_math::{amount0_delta, amount1_delta};
use super::tick_math::sqrt_ratio_at_tick;
use crate::domain::PositionSnapshot;

/// Token amounts `(amount0, amount1)` currently held by a position, rounded down.
///
/// The branch is chosen on the pool's current tick; amounts inside the range
/// use the pool's exact sqrt price:
/// - below the range everything is token0;
/// - `tick_lower <= tick < tick_upper` splits at the current price;
/// - at or above `tick_upper` everything is token1.
pub fn value_position(position: &PositionSnapshot) -> (U256, U256) {
    let sqrt_lower = sqrt_ratio_at_tick(position.tick_lower);
    let sqrt_upper = sqrt_ratio_at_tick(position.tick_upper);
    let liquidity = position.liquidity;

    if position.tick_current < position.tick_lower {
        (
            amount0_delta(sqrt_lower, sqrt_upper, liquidity, false),
            U256::ZERO,
        )
    } else if position.tick_current < position.tick_upper {
        (
            amount0_delta(position.sqrt_price_x96, sqrt_upper, liquidity, false),
            amount1_delta(sqrt_lower, position.sqrt_price_x96, liquidity, false),
        )
    } else {
        (
            U256::ZERO,
            amount1_delta(sqrt_lower, sqrt_upper, liquidity, false),
        )
    }
}
