//! Integer fixed-point primitives and the tick to sqrt-price ladder.
//!
//! Everything here is total: out-of-range inputs and divisions by zero yield
//! defined values (`U256::ZERO` or `None`) instead of panicking.

use alloy_primitives::ruint::UintTryFrom;
use alloy_primitives::{U256, U512};

/// Lowest tick representable by the price grid.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick representable by the price grid.
pub const MAX_TICK: i32 = -MIN_TICK;

/// `sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4_295_128_739, 0, 0, 0]);
/// `sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U256 = U256::from_limbs([
    6_743_328_256_752_651_558,
    17_280_870_778_742_802_505,
    4_294_805_859,
    0,
]);

/// 2^96, the Q64.96 unit.
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);

const fn q128(value: u128) -> U256 {
    U256::from_limbs([value as u64, (value >> 64) as u64, 0, 0])
}

/// sqrt(1.0001)^-1 in Q128.128, used when bit 0 of |tick| is set.
const ODD_TICK_RATIO: U256 = q128(0xfffcb933bd6fad37aa2d162d1a594001);

/// sqrt(1.0001)^-(2^i) in Q128.128 for bits 0x2 through 0x80000.
const TICK_FACTORS: [U256; 19] = [
    q128(0xfff97272373d413259a46990580e213a),
    q128(0xfff2e50f5f656932ef12357cf3c7fdcc),
    q128(0xffe5caca7e10e4e61c3624eaa0941cd0),
    q128(0xffcb9843d60f6159c9db58835c926644),
    q128(0xff973b41fa98c081472e6896dfb254c0),
    q128(0xff2ea16466c96a3843ec78b326b52861),
    q128(0xfe5dee046a99a2a811c461f1969c3053),
    q128(0xfcbe86c7900a88aedcffc83b479aa3a4),
    q128(0xf987a7253ac413176f2b074cf7815e54),
    q128(0xf3392b0822b70005940c7a398e4b70f3),
    q128(0xe7159475a2c29b7443b29c7fa6e889d9),
    q128(0xd097f3bdfd2022b8845ad8f792aa5825),
    q128(0xa9f746462d870fdf8a65dc1f90e061e5),
    q128(0x70d869a156d2a1b890bb3df62baf32f7),
    q128(0x31be135f97d08fd981231505542fcfa6),
    q128(0x09aa508b5b7a84e1c677de54f3e99bc9),
    q128(0x005d6af8dedb81196699c329225ee604),
    q128(0x00002216e584f5fa1ea926041bedfe98),
    q128(0x00000000048a170391f7dc42444e8fa2),
];

/// `value * multiplier >> 128`, the multiplier read as a Q128.128 fraction.
pub fn shifted_multiply(value: U256, multiplier: U256) -> U256 {
    let product = U512::from(value) * U512::from(multiplier);
    U256::saturating_from(product >> 128)
}

/// `floor(a * b / denominator)` with a 512-bit intermediate product.
///
/// `None` when the denominator is zero or the quotient does not fit 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let quotient = U512::from(a) * U512::from(b) / U512::from(denominator);
    U256::uint_try_from(quotient).ok()
}

/// `ceil(a * b / denominator)` with a 512-bit intermediate product.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product = U512::from(a) * U512::from(b);
    let denominator = U512::from(denominator);
    let mut quotient = product / denominator;
    if !(product % denominator).is_zero() {
        quotient += U512::from(1u64);
    }
    U256::uint_try_from(quotient).ok()
}

/// `ceil(numerator / denominator)`; `None` on a zero denominator.
pub fn div_rounding_up(numerator: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let quotient = numerator / denominator;
    if (numerator % denominator).is_zero() {
        Some(quotient)
    } else {
        Some(quotient + U256::from(1u64))
    }
}

/// sqrt(1.0001^tick) * 2^96, or `U256::ZERO` outside `[MIN_TICK, MAX_TICK]`.
///
/// Evaluates 1.0001^(-|tick|/2) by binary exponentiation over Q128.128
/// factors, inverts for positive ticks, then rescales to Q64.96 rounding up.
pub fn sqrt_ratio_at_tick(tick: i32) -> U256 {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return U256::ZERO;
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        ODD_TICK_RATIO
    } else {
        U256::from(1u64) << 128
    };

    for (bit, factor) in TICK_FACTORS.iter().enumerate() {
        if abs_tick & (0x2 << bit) != 0 {
            ratio = shifted_multiply(ratio, *factor);
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    let remainder = ratio & U256::from(u32::MAX);
    let rounded = if remainder.is_zero() {
        U256::ZERO
    } else {
        U256::from(1u64)
    };
    (ratio >> 32) + rounded
}

/// sqrt(amount1 / amount0) * 2^96, floored; the sqrt price at which a pool
/// trades `amount0` of token0 against `amount1` of token1.
///
/// `None` when `amount0` is zero or the result exceeds 160 bits.
pub fn encode_sqrt_ratio_x96(amount1: U256, amount0: U256) -> Option<U256> {
    if amount0.is_zero() {
        return None;
    }
    let ratio_x192 = (U512::from(amount1) << 192) / U512::from(amount0);
    let root = isqrt(ratio_x192);
    if root > U512::from(MAX_SQRT_RATIO) {
        return None;
    }
    U256::uint_try_from(root).ok()
}

/// Integer square root by Newton iteration.
fn isqrt(value: U512) -> U512 {
    if value < U512::from(2u64) {
        return value;
    }
    let mut x = value;
    let mut y = (x + U512::from(1u64)) >> 1;
    while y < x {
        x = y;
        y = (x + value / x) >> 1;
    }
    x
}
