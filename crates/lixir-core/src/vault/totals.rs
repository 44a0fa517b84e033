//! Valuation of a vault's holdings at the live or a hypothetical price.

use alloy_primitives::U256;

use crate::errors::{CoreResult, VaultError};
use crate::math::{get_amounts_for_liquidity, sqrt_ratio_at_tick, sqrt_ratios_for_range, Rounding};
use crate::pool::Pool;
use crate::position_key::position_key;
use crate::types::{TickRange, Totals};
use crate::vault::Vault;

impl Vault {
    /// Liquidity the pool records for this vault over `range`
    pub fn liquidity_in<P: Pool + ?Sized>(&self, pool: &P, range: TickRange) -> u128 {
        if !range.is_set() {
            return 0;
        }
        pool.position(position_key(self.address, range.tick_lower, range.tick_upper))
            .liquidity
    }

    pub fn main_liquidity<P: Pool + ?Sized>(&self, pool: &P) -> u128 {
        self.liquidity_in(pool, self.main)
    }

    pub fn range_liquidity<P: Pool + ?Sized>(&self, pool: &P) -> u128 {
        self.liquidity_in(pool, self.range)
    }

    /// Token balances held by the vault outside any position
    pub fn idle_balances<P: Pool + ?Sized>(&self, pool: &P) -> (u128, u128) {
        (
            pool.balance_of(self.token0, self.address),
            pool.balance_of(self.token1, self.address),
        )
    }

    /// Holdings at the pool's current price, position amounts rounded down
    pub fn calculate_totals<P: Pool + ?Sized>(&self, pool: &P) -> CoreResult<Totals> {
        self.totals_at(pool, pool.slot0().sqrt_price_x96, Rounding::Down)
    }

    /// Holdings as if the pool were at `tick`, position amounts rounded down
    pub fn calculate_totals_from_tick<P: Pool + ?Sized>(
        &self,
        pool: &P,
        tick: i32,
    ) -> CoreResult<Totals> {
        self.totals_at(pool, sqrt_ratio_at_tick(tick)?, Rounding::Down)
    }

    pub(crate) fn totals_at<P: Pool + ?Sized>(
        &self,
        pool: &P,
        sqrt_price_x96: U256,
        rounding: Rounding,
    ) -> CoreResult<Totals> {
        let (idle0, idle1) = self.idle_balances(pool);
        let main_liquidity = self.main_liquidity(pool);
        let range_liquidity = self.range_liquidity(pool);

        let (main0, main1) = position_amounts(sqrt_price_x96, self.main, main_liquidity, rounding)?;
        let (range0, range1) =
            position_amounts(sqrt_price_x96, self.range, range_liquidity, rounding)?;

        Ok(Totals {
            total0: checked_sum([idle0, main0, range0])?,
            total1: checked_sum([idle1, main1, range1])?,
            main_liquidity,
            range_liquidity,
        })
    }
}

fn position_amounts(
    sqrt_price_x96: U256,
    range: TickRange,
    liquidity: u128,
    rounding: Rounding,
) -> CoreResult<(u128, u128)> {
    if liquidity == 0 {
        return Ok((0, 0));
    }
    let (sqrt_lower, sqrt_upper) = sqrt_ratios_for_range(&range)?;
    get_amounts_for_liquidity(sqrt_price_x96, sqrt_lower, sqrt_upper, liquidity, rounding)
}

fn checked_sum<const N: usize>(values: [u128; N]) -> CoreResult<u128> {
    values
        .into_iter()
        .try_fold(0u128, |acc, value| acc.checked_add(value))
        .ok_or(VaultError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q96;

    #[test]
    fn test_unset_or_empty_positions_hold_nothing() {
        let price = U256::from(Q96);
        assert_eq!(position_amounts(price, TickRange::UNSET, 0, Rounding::Down).unwrap(), (0, 0));
        assert_eq!(
            position_amounts(price, TickRange::new(-60, 60), 0, Rounding::Down).unwrap(),
            (0, 0)
        );
    }

    #[test]
    fn test_position_amounts_one_sided_beyond_range() {
        let range = TickRange::new(-1800, 1800);
        let liquidity = 10u128.pow(18);

        let below = sqrt_ratio_at_tick(-3000).unwrap();
        let (amount0, amount1) = position_amounts(below, range, liquidity, Rounding::Down).unwrap();
        assert!(amount0 > 0);
        assert_eq!(amount1, 0);

        let above = sqrt_ratio_at_tick(3000).unwrap();
        let (amount0, amount1) = position_amounts(above, range, liquidity, Rounding::Down).unwrap();
        assert_eq!(amount0, 0);
        assert!(amount1 > 0);
    }

    #[test]
    fn test_checked_sum_overflow() {
        assert_eq!(checked_sum([1, 2, 3]).unwrap(), 6);
        assert_eq!(checked_sum([u128::MAX, 1]), Err(VaultError::MathOverflow));
    }
}
