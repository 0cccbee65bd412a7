//! Concentrated-liquidity position and pool-state reads.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Pool price state as returned by `slot0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

/// A liquidity position as read from the position manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub token0: Address,
    pub token1: Address,
    /// Fee tier in hundredths of a basis point (500 = 0.05%).
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
}

/// A position paired with the current state of its pool.
///
/// Immutable for the duration of one valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub tick_current: i32,
    pub sqrt_price_x96: U256,
}

impl PositionSnapshot {
    pub fn new(position: PositionInfo, slot0: Slot0) -> Self {
        Self {
            token0: position.token0,
            token1: position.token1,
            fee: position.fee,
            tick_lower: position.tick_lower,
            tick_upper: position.tick_upper,
            liquidity: position.liquidity,
            tick_current: slot0.tick,
            sqrt_price_x96: slot0.sqrt_price_x96,
        }
    }
}
