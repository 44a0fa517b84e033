//! # Liquidity Math
//!
//! Token amounts held by a concentrated-liquidity position and the liquidity a
//! pair of amounts can fund. Rounding follows the pool: amounts a position owes
//! round down, amounts required to mint round up.

use alloy_primitives::U256;

use crate::constants::{Q96, RESOLUTION};
use crate::errors::{CoreResult, VaultError};
use crate::math::big_int::{div_rounding_up, mul_div, to_u128, Rounding};

fn ordered(sqrt_ratio_a_x96: U256, sqrt_ratio_b_x96: U256) -> (U256, U256) {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    } else {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96)
    }
}

/// Token0 between two sqrt prices for `liquidity`: `L * (b - a) / (a * b)`
pub fn get_amount_0_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    rounding: Rounding,
) -> CoreResult<u128> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_a.is_zero() {
        return Err(VaultError::InvalidSqrtPrice);
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = sqrt_b - sqrt_a;

    let amount = match rounding {
        Rounding::Up => {
            div_rounding_up(mul_div(numerator1, numerator2, sqrt_b, Rounding::Up)?, sqrt_a)?
        }
        Rounding::Down => mul_div(numerator1, numerator2, sqrt_b, Rounding::Down)? / sqrt_a,
    };
    to_u128(amount)
}

/// Token1 between two sqrt prices for `liquidity`: `L * (b - a)`
pub fn get_amount_1_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    rounding: Rounding,
) -> CoreResult<u128> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let amount = mul_div(U256::from(liquidity), sqrt_b - sqrt_a, U256::from(Q96), rounding)?;
    to_u128(amount)
}

/// Token amounts represented by `liquidity` in `[a, b]` at `sqrt_price_x96`
pub fn get_amounts_for_liquidity(
    sqrt_price_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    rounding: Rounding,
) -> CoreResult<(u128, u128)> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if liquidity == 0 {
        return Ok((0, 0));
    }

    if sqrt_price_x96 <= sqrt_a {
        Ok((get_amount_0_delta(sqrt_a, sqrt_b, liquidity, rounding)?, 0))
    } else if sqrt_price_x96 < sqrt_b {
        Ok((
            get_amount_0_delta(sqrt_price_x96, sqrt_b, liquidity, rounding)?,
            get_amount_1_delta(sqrt_a, sqrt_price_x96, liquidity, rounding)?,
        ))
    } else {
        Ok((0, get_amount_1_delta(sqrt_a, sqrt_b, liquidity, rounding)?))
    }
}

/// Liquidity funded by `amount0` over `[a, b]`
pub fn get_liquidity_for_amount_0(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: u128,
) -> CoreResult<U256> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_a == sqrt_b {
        return Err(VaultError::DivisionByZero);
    }
    let intermediate = mul_div(sqrt_a, sqrt_b, U256::from(Q96), Rounding::Down)?;
    mul_div(U256::from(amount0), intermediate, sqrt_b - sqrt_a, Rounding::Down)
}

/// Liquidity funded by `amount1` over `[a, b]`
pub fn get_liquidity_for_amount_1(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount1: u128,
) -> CoreResult<U256> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_a == sqrt_b {
        return Err(VaultError::DivisionByZero);
    }
    mul_div(U256::from(amount1), U256::from(Q96), sqrt_b - sqrt_a, Rounding::Down)
}

/// Maximum liquidity `(amount0, amount1)` can fund in `[a, b]` at `sqrt_price_x96`.
///
/// Minting the returned liquidity never costs more than the given amounts.
/// Fails with `ConversionError` when the liquidity does not fit in a `u128`.
pub fn get_liquidity_for_amounts(
    sqrt_price_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: u128,
    amount1: u128,
) -> CoreResult<u128> {
    let (sqrt_a, sqrt_b) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    let liquidity = if sqrt_price_x96 <= sqrt_a {
        get_liquidity_for_amount_0(sqrt_a, sqrt_b, amount0)?
    } else if sqrt_price_x96 < sqrt_b {
        let liquidity0 = get_liquidity_for_amount_0(sqrt_price_x96, sqrt_b, amount0)?;
        let liquidity1 = get_liquidity_for_amount_1(sqrt_a, sqrt_price_x96, amount1)?;
        liquidity0.min(liquidity1)
    } else {
        get_liquidity_for_amount_1(sqrt_a, sqrt_b, amount1)?
    };

    to_u128(liquidity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_math::sqrt_ratio_at_tick;
    use crate::constants::MIN_TICK;

    fn sqrt(tick: i32) -> U256 {
        sqrt_ratio_at_tick(tick).unwrap()
    }

    #[test]
    fn test_amount_deltas_round_in_pool_favour() {
        let (a, b) = (sqrt(-600), sqrt(600));
        let liquidity = 1_000_000_007u128;

        let down0 = get_amount_0_delta(a, b, liquidity, Rounding::Down).unwrap();
        let up0 = get_amount_0_delta(a, b, liquidity, Rounding::Up).unwrap();
        assert!(down0 > 0);
        assert!(up0 == down0 || up0 == down0 + 1);

        let down1 = get_amount_1_delta(a, b, liquidity, Rounding::Down).unwrap();
        let up1 = get_amount_1_delta(b, a, liquidity, Rounding::Up).unwrap();
        assert!(up1 == down1 || up1 == down1 + 1);
    }

    #[test]
    fn test_amounts_outside_range_are_single_sided() {
        let (a, b) = (sqrt(-1800), sqrt(1800));
        let liquidity = 10u128.pow(18);

        let (below0, below1) =
            get_amounts_for_liquidity(sqrt(-1801), a, b, liquidity, Rounding::Down).unwrap();
        assert!(below0 > 0);
        assert_eq!(below1, 0);

        let (above0, above1) =
            get_amounts_for_liquidity(sqrt(1800), a, b, liquidity, Rounding::Down).unwrap();
        assert_eq!(above0, 0);
        assert!(above1 > 0);
    }

    #[test]
    fn test_liquidity_for_amounts_is_affordable() {
        let (a, b) = (sqrt(-1800), sqrt(1800));
        for (price_tick, amount0, amount1) in [
            (0, 10u128.pow(18), 10u128.pow(18)),
            (-900, 123_456_789, 10u128.pow(24)),
            (1700, 10u128.pow(30), 7),
            (-5000, 10u128.pow(12), 0),
            (5000, 0, 10u128.pow(12)),
        ] {
            let price = sqrt(price_tick);
            let liquidity = get_liquidity_for_amounts(price, a, b, amount0, amount1).unwrap();
            let (cost0, cost1) =
                get_amounts_for_liquidity(price, a, b, liquidity, Rounding::Up).unwrap();
            assert!(cost0 <= amount0, "token0 cost {} > {}", cost0, amount0);
            assert!(cost1 <= amount1, "token1 cost {} > {}", cost1, amount1);
        }
    }

    #[test]
    fn test_liquidity_overflow_is_an_error() {
        // One-tick range at the bottom of the price scale, fully in token1
        let (a, b) = (sqrt(MIN_TICK), sqrt(MIN_TICK + 1));
        let price = sqrt(MIN_TICK + 10);
        assert_eq!(
            get_liquidity_for_amounts(price, a, b, 0, u128::MAX),
            Err(VaultError::ConversionError)
        );
        assert!(get_liquidity_for_amounts(price, a, b, 0, 1_000).unwrap() > 0);
    }

    #[test]
    fn test_symmetric_deposit_at_unit_price() {
        let (a, b) = (sqrt(-1800), sqrt(1800));
        let price = U256::from(Q96);
        let liquidity =
            get_liquidity_for_amounts(price, a, b, 10u128.pow(18), 10u128.pow(18)).unwrap();
        let (amount0, amount1) =
            get_amounts_for_liquidity(price, a, b, liquidity, Rounding::Down).unwrap();
        // At tick 0 a symmetric range holds equal amounts of both tokens
        assert!(amount0.abs_diff(amount1) <= 1_000);
    }
}
