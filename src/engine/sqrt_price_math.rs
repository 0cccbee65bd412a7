//! Token amounts spanned by liquidity between two sqrt prices.

use alloy_primitives::U256;

use super::tick_math::{div_rounding_up, mul_div, mul_div_rounding_up, Q96};

fn ordered(sqrt_a: U256, sqrt_b: U256) -> (U256, U256) {
    if sqrt_a > sqrt_b {
        (sqrt_b, sqrt_a)
    } else {
        (sqrt_a, sqrt_b)
    }
}

/// Amount of token0 between two sqrt prices:
/// `(liquidity << 96) * (sqrt_b - sqrt_a) / sqrt_b / sqrt_a`.
///
/// Argument order does not matter. Yields zero when the lower price is zero.
pub fn amount0_delta(sqrt_a: U256, sqrt_b: U256, liquidity: u128, round_up: bool) -> U256 {
    let (sqrt_a, sqrt_b) = ordered(sqrt_a, sqrt_b);
    if sqrt_a.is_zero() {
        return U256::ZERO;
    }

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = sqrt_b - sqrt_a;

    if round_up {
        mul_div_rounding_up(numerator1, numerator2, sqrt_b)
            .and_then(|partial| div_rounding_up(partial, sqrt_a))
            .unwrap_or(U256::ZERO)
    } else {
        mul_div(numerator1, numerator2, sqrt_b)
            .map(|partial| partial / sqrt_a)
            .unwrap_or(U256::ZERO)
    }
}

/// Amount of token1 between two sqrt prices: `liquidity * (sqrt_b - sqrt_a) / 2^96`.
pub fn amount1_delta(sqrt_a: U256, sqrt_b: U256, liquidity: u128, round_up: bool) -> U256 {
    let (sqrt_a, sqrt_b) = ordered(sqrt_a, sqrt_b);
    let liquidity = U256::from(liquidity);
    let diff = sqrt_b - sqrt_a;

    let amount = if round_up {
        mul_div_rounding_up(liquidity, diff, Q96)
    } else {
        mul_div(liquidity, diff, Q96)
    };
    amount.unwrap_or(U256::ZERO)
}
