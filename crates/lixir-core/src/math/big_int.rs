//! Big integer helpers for high-precision math
//!
//! Full-precision `mul_div` over 256-bit operands with a 512-bit intermediate,
//! plus checked conversions between `U256` and `u128`.

use alloy_primitives::{U256, U512};

use crate::errors::{CoreResult, VaultError};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

fn widen(value: U256) -> U512 {
    let mut limbs = [0u64; 8];
    limbs[..4].copy_from_slice(value.as_limbs());
    U512::from_limbs(limbs)
}

fn narrow(value: U512) -> CoreResult<U256> {
    let limbs = value.as_limbs();
    if limbs[4..].iter().any(|limb| *limb != 0) {
        return Err(VaultError::MulDivOverflow);
    }
    Ok(U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]]))
}

/// Compute `a * b / denominator` without intermediate overflow
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> CoreResult<U256> {
    if denominator.is_zero() {
        return Err(VaultError::DivisionByZero);
    }

    let product = widen(a)
        .checked_mul(widen(b))
        .ok_or(VaultError::MulDivOverflow)?;
    let (quotient, remainder) = product.div_rem(widen(denominator));

    let quotient = narrow(quotient)?;
    match rounding {
        Rounding::Up if !remainder.is_zero() => quotient
            .checked_add(U256::from(1u8))
            .ok_or(VaultError::MulDivOverflow),
        _ => Ok(quotient),
    }
}

/// `mul_div` on u128 operands with a u128 result
pub fn mul_div_u128(a: u128, b: u128, denominator: u128, rounding: Rounding) -> CoreResult<u128> {
    let result = mul_div(U256::from(a), U256::from(b), U256::from(denominator), rounding)?;
    to_u128(result)
}

/// Divide rounding towards positive infinity
pub fn div_rounding_up(numerator: U256, denominator: U256) -> CoreResult<U256> {
    if denominator.is_zero() {
        return Err(VaultError::DivisionByZero);
    }
    let (quotient, remainder) = numerator.div_rem(denominator);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        quotient
            .checked_add(U256::from(1u8))
            .ok_or(VaultError::MathOverflow)
    }
}

/// Convert to u128, failing on overflow
pub fn to_u128(value: U256) -> CoreResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(VaultError::ConversionError);
    }
    Ok(value.to::<u128>())
}
