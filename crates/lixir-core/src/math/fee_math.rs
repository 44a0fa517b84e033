//! # Fee Math
//!
//! Valuation of token pairs in a common unit and the performance-fee dilution.

use alloy_primitives::U256;

use crate::constants::{PERFORMANCE_FEE_PRECISION, Q96};
use crate::errors::CoreResult;
use crate::math::big_int::{mul_div, to_u128, Rounding};

/// Value of `(amount0, amount1)` in token1 at `sqrt_price_x96`
pub fn value_in_token1(sqrt_price_x96: U256, amount0: u128, amount1: u128) -> CoreResult<U256> {
    let q96 = U256::from(Q96);
    let half = mul_div(U256::from(amount0), sqrt_price_x96, q96, Rounding::Down)?;
    let amount0_in_token1 = mul_div(half, sqrt_price_x96, q96, Rounding::Down)?;
    Ok(amount0_in_token1.saturating_add(U256::from(amount1)))
}

/// Shares to mint so the fee recipient ends up owning `fee` of `growth`.
///
/// With `S` shares outstanding and vault value `total_value` (growth included),
/// minting `S * f * G / (V - f * G)` shares gives the recipient a claim worth
/// exactly `f * G`. Returns zero when there is no growth to charge.
pub fn performance_fee_shares(
    total_supply: u128,
    performance_fee: u32,
    growth: U256,
    total_value: U256,
) -> CoreResult<u128> {
    if total_supply == 0 || performance_fee == 0 || growth.is_zero() || total_value.is_zero() {
        return Ok(0);
    }

    let fee_growth = growth.saturating_mul(U256::from(performance_fee));
    let scaled_value = total_value.saturating_mul(U256::from(PERFORMANCE_FEE_PRECISION));
    if scaled_value <= fee_growth {
        return Ok(0);
    }

    let shares = mul_div(
        U256::from(total_supply),
        fee_growth,
        scaled_value - fee_growth,
        Rounding::Down,
    )?;
    to_u128(shares)
}
