//! # Tick Math
//!
//! Rounding ticks onto a spacing grid, deriving position bounds from a center tick
//! and a spread, and converting between ticks and Q64.96 sqrt prices.
//!
//! `sqrt_ratio_at_tick` reproduces the pool's own conversion bit for bit, so
//! valuations computed here agree with what the pool charges and pays out.

use alloy_primitives::U256;

use crate::constants::{MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};
use crate::errors::{CoreResult, VaultError};
use crate::types::TickRange;

/// sqrt(1.0001)^-(2^i) in Q128 for i = 1..=19
const MAGIC_SQRT_1_0001_POW_2: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

/// Largest multiple of `tick_spacing` that is <= `tick`, clamped to `MIN_TICK`.
///
/// `tick_spacing` must be positive.
pub fn round_tick_down(tick: i32, tick_spacing: i32) -> i32 {
    debug_assert!(tick_spacing > 0);
    let tick_mod = tick.rem_euclid(tick_spacing);
    let rounded = if tick_mod == 0 { tick } else { tick.saturating_sub(tick_mod) };
    rounded.max(MIN_TICK)
}

/// Smallest multiple of `tick_spacing` that is >= `tick`, clamped to `MAX_TICK`.
pub fn round_tick_up(tick: i32, tick_spacing: i32) -> i32 {
    let tick_down = round_tick_down(tick, tick_spacing);
    let rounded = if tick == tick_down {
        tick
    } else {
        tick_down.saturating_add(tick_spacing)
    };
    rounded.min(MAX_TICK)
}

/// Main position bounds: `center +- spread` widened outwards onto the spacing grid
pub fn get_main_ticks(center_tick: i32, tick_spacing: i32, spread: i32) -> CoreResult<TickRange> {
    if tick_spacing <= 0 {
        return Err(VaultError::configuration("tick spacing must be positive"));
    }
    let lower = round_tick_down(center_tick.saturating_sub(spread), tick_spacing);
    let upper = round_tick_up(center_tick.saturating_add(spread), tick_spacing);
    if lower >= upper {
        return Err(VaultError::configuration(format!(
            "spread {} around tick {} collapses to [{}, {}]",
            spread, center_tick, lower, upper
        )));
    }
    Ok(TickRange::new(lower, upper))
}

/// Range just below `center_tick`. Holds only token1 while the price is above it.
pub fn get_bid_ticks(center_tick: i32, tick_spacing: i32, spread: i32) -> CoreResult<TickRange> {
    if tick_spacing <= 0 {
        return Err(VaultError::configuration("tick spacing must be positive"));
    }
    let upper = round_tick_down(center_tick, tick_spacing);
    let lower = round_tick_down(center_tick.saturating_sub(spread), tick_spacing)
        .min(upper.saturating_sub(tick_spacing))
        .max(MIN_TICK);
    let range = TickRange::new(lower, upper);
    range.validate(tick_spacing)?;
    Ok(range)
}

/// Range just above `center_tick`. Holds only token0 while the price is below it.
pub fn get_ask_ticks(center_tick: i32, tick_spacing: i32, spread: i32) -> CoreResult<TickRange> {
    if tick_spacing <= 0 {
        return Err(VaultError::configuration("tick spacing must be positive"));
    }
    let lower = round_tick_down(center_tick, tick_spacing).saturating_add(tick_spacing);
    let upper = round_tick_up(center_tick.saturating_add(spread), tick_spacing)
        .max(lower.saturating_add(tick_spacing))
        .min(MAX_TICK);
    let range = TickRange::new(lower, upper);
    range.validate(tick_spacing)?;
    Ok(range)
}

/// Q64.96 sqrt(1.0001^tick)
pub fn sqrt_ratio_at_tick(tick: i32) -> CoreResult<U256> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(VaultError::InvalidTick(tick));
    }

    let abs_tick = tick.unsigned_abs();
    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::from(1u8) << 128usize
    };

    // Binary decomposition of |tick|; every product stays below 2^256
    for (bit, magic) in MAGIC_SQRT_1_0001_POW_2 {
        if abs_tick & bit != 0 {
            ratio = (ratio * U256::from(magic)) >> 128usize;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let remainder = ratio & U256::from(u32::MAX);
    let sqrt_ratio = ratio >> 32usize;
    Ok(if remainder.is_zero() {
        sqrt_ratio
    } else {
        sqrt_ratio + U256::from(1u8)
    })
}

/// Greatest tick whose sqrt ratio is <= `sqrt_price_x96`
pub fn tick_at_sqrt_ratio(sqrt_price_x96: U256) -> CoreResult<i32> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(VaultError::InvalidSqrtPrice);
    }

    let mut low = MIN_TICK;
    let mut high = MAX_TICK;
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Ok(low)
}

/// Sqrt ratios at both bounds of a range
pub fn sqrt_ratios_for_range(range: &TickRange) -> CoreResult<(U256, U256)> {
    Ok((
        sqrt_ratio_at_tick(range.tick_lower)?,
        sqrt_ratio_at_tick(range.tick_upper)?,
    ))
}
