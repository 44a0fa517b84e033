//! # Swap Simulator
//!
//! Exact-input swaps against a [`SimulatedPool`].
//!
//! The pool finds the furthest sqrt price the trade can afford: the input every
//! position needs to move the price there (rounded up, after the swap fee) must
//! not exceed the amount in. The trader receives what the positions release
//! over the same path, rounded down. Fees accrue to positions that were active
//! at the starting price, pro rata to their liquidity, as tokens owed.

use alloy_primitives::{Address, U256};
use lixir_core::math::{
    get_amount_0_delta, get_amount_1_delta, mul_div_u128, sqrt_ratios_for_range, Rounding,
};
use lixir_core::{
    CoreResult, TokenCustody, VaultError, MAX_SQRT_RATIO, MIN_SQRT_RATIO, POOL_FEE_PRECISION,
};

use crate::market::SimulatedPool;

/// Result of an executed swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapExecution {
    pub zero_for_one: bool,
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee_paid: u128,
    pub tick_before: i32,
    pub tick_after: i32,
}

/// Liquidity segment a swap may cross
#[derive(Debug, Clone, Copy)]
struct Segment {
    sqrt_lower: U256,
    sqrt_upper: U256,
    liquidity: u128,
}

impl SimulatedPool {
    /// Swap `amount_in` of token0 (`zero_for_one`) or token1 from `trader`
    pub fn swap_exact_input(
        &mut self,
        trader: Address,
        zero_for_one: bool,
        amount_in: u128,
    ) -> CoreResult<SwapExecution> {
        if amount_in == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let (token_in, token_out) = if zero_for_one {
            (self.token0, self.token1)
        } else {
            (self.token1, self.token0)
        };
        if self.balance_of(token_in, trader) < amount_in {
            return Err(VaultError::InsufficientBalance);
        }

        let fee_paid = mul_div_u128(
            amount_in,
            u128::from(self.fee),
            u128::from(POOL_FEE_PRECISION),
            Rounding::Up,
        )?;
        let budget = amount_in - fee_paid.min(amount_in);
        let segments = self.segments()?;

        let start = self.sqrt_price_x96;
        let target = find_target_price(&segments, start, zero_for_one, budget);
        let (input, output) =
            path_amounts(&segments, start, target, zero_for_one).ok_or(VaultError::MathOverflow)?;
        if output == 0 {
            return Err(VaultError::InvalidAmount);
        }

        let tick_before = self.tick;
        self.accrue_fees(zero_for_one, fee_paid)?;
        let pool = self.address;
        self.transfer(token_in, trader, pool, input + fee_paid)?;
        self.transfer(token_out, pool, trader, output)?;
        self.set_price(target)?;

        log::trace!(
            "Swap {} {} in for {} out, tick {} -> {}",
            if zero_for_one { "0->1" } else { "1->0" },
            input + fee_paid,
            output,
            tick_before,
            self.tick
        );
        Ok(SwapExecution {
            zero_for_one,
            amount_in: input + fee_paid,
            amount_out: output,
            fee_paid,
            tick_before,
            tick_after: self.tick,
        })
    }

    /// Input needed to move the price to `target_tick`, fee included
    pub fn quote_input_to_tick(&self, target_tick: i32) -> CoreResult<(bool, u128)> {
        let target = lixir_core::math::sqrt_ratio_at_tick(target_tick)?;
        let zero_for_one = target < self.sqrt_price_x96;
        let segments = self.segments()?;
        let (input, _) =
            path_amounts(&segments, self.sqrt_price_x96, target, zero_for_one)
                .ok_or(VaultError::MathOverflow)?;
        let fee_rate = u128::from(POOL_FEE_PRECISION - self.fee);
        let gross = mul_div_u128(input, u128::from(POOL_FEE_PRECISION), fee_rate, Rounding::Up)?;
        Ok((zero_for_one, gross))
    }

    fn segments(&self) -> CoreResult<Vec<Segment>> {
        self.positions
            .values()
            .filter(|position| position.liquidity > 0)
            .map(|position| {
                let (sqrt_lower, sqrt_upper) = sqrt_ratios_for_range(&position.range)?;
                Ok(Segment {
                    sqrt_lower,
                    sqrt_upper,
                    liquidity: position.liquidity,
                })
            })
            .collect()
    }

    fn accrue_fees(&mut self, zero_for_one: bool, fee: u128) -> CoreResult<()> {
        let active = self.active_liquidity();
        if active == 0 || fee == 0 {
            return Ok(());
        }
        let tick = self.tick;
        for position in self.positions.values_mut() {
            if !position.range.contains(tick) || position.liquidity == 0 {
                continue;
            }
            let share = mul_div_u128(fee, position.liquidity, active, Rounding::Down)?;
            let owed = if zero_for_one {
                &mut position.tokens_owed0
            } else {
                &mut position.tokens_owed1
            };
            *owed = owed.checked_add(share).ok_or(VaultError::MathOverflow)?;
        }
        Ok(())
    }
}

/// Furthest price reachable with `budget`; the search keeps the invariant that
/// the current bound is affordable
fn find_target_price(segments: &[Segment], start: U256, zero_for_one: bool, budget: u128) -> U256 {
    let one = U256::from(1u8);
    let affordable = |price: U256| {
        path_amounts(segments, start, price, zero_for_one).is_some_and(|(input, _)| input <= budget)
    };

    if zero_for_one {
        let (mut low, mut high) = (MIN_SQRT_RATIO, start);
        while low < high {
            let mid = low + (high - low) / U256::from(2u8);
            if affordable(mid) {
                high = mid;
            } else {
                low = mid + one;
            }
        }
        high
    } else {
        let (mut low, mut high) = (start, MAX_SQRT_RATIO - one);
        while low < high {
            let mid = low + (high - low + one) / U256::from(2u8);
            if affordable(mid) {
                low = mid;
            } else {
                high = mid - one;
            }
        }
        low
    }
}

/// `(input, output)` for moving the price from `start` to `end` across every
/// segment. `None` when an amount does not fit in u128.
fn path_amounts(
    segments: &[Segment],
    start: U256,
    end: U256,
    zero_for_one: bool,
) -> Option<(u128, u128)> {
    let (path_low, path_high) = if start <= end { (start, end) } else { (end, start) };
    let mut input = 0u128;
    let mut output = 0u128;

    for segment in segments {
        let low = path_low.max(segment.sqrt_lower);
        let high = path_high.min(segment.sqrt_upper);
        if low >= high {
            continue;
        }
        let (segment_in, segment_out) = if zero_for_one {
            (
                get_amount_0_delta(low, high, segment.liquidity, Rounding::Up).ok()?,
                get_amount_1_delta(low, high, segment.liquidity, Rounding::Down).ok()?,
            )
        } else {
            (
                get_amount_1_delta(low, high, segment.liquidity, Rounding::Up).ok()?,
                get_amount_0_delta(low, high, segment.liquidity, Rounding::Down).ok()?,
            )
        };
        input = input.checked_add(segment_in)?;
        output = output.checked_add(segment_out)?;
    }
    Some((input, output))
}
