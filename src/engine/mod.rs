//! Pure computation engine: fixed-point math, position valuation and the
//! investor accounting state machine. Nothing here performs I/O.

pub mod accounting;
pub mod position;
pub mod sqrt_price_math;
pub mod tick_math;

pub use accounting::{
    apply_accounting_event, recompute_profit, AccountingKind, Valuation, ValueOverflow,
};
pub use position::value_position;
pub use sqrt_price_math::{amount0_delta, amount1_delta};
pub use tick_math::{
    div_rounding_up, encode_sqrt_ratio_x96, mul_div, mul_div_rounding_up, shifted_multiply,
    sqrt_ratio_at_tick, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, Q96,
};
