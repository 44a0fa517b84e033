//! Property tests for tick rounding, position bounds, sqrt-price conversion and
//! liquidity amounts

use lixir_core::math::{
    get_amounts_for_liquidity, get_ask_ticks, get_bid_ticks, get_liquidity_for_amounts,
    get_main_ticks, round_tick_down, round_tick_up, sqrt_ratio_at_tick, tick_at_sqrt_ratio,
    Rounding,
};
use lixir_core::{position_key, Address, MAX_TICK, MIN_TICK};
use proptest::prelude::*;

fn aligned(tick: i32, spacing: i32) -> bool {
    tick % spacing == 0 || tick == MIN_TICK || tick == MAX_TICK
}

proptest! {
    #[test]
    fn prop_rounding_brackets_tick(tick in MIN_TICK..=MAX_TICK, spacing in 1i32..=16_384) {
        let down = round_tick_down(tick, spacing);
        let up = round_tick_up(tick, spacing);
        prop_assert!(down <= tick && tick <= up);
        prop_assert!(aligned(down, spacing));
        prop_assert!(aligned(up, spacing));
        prop_assert!(tick - down < spacing);
        prop_assert!(up - tick < spacing);
    }

    #[test]
    fn prop_main_ticks_contain_spread(
        center in -800_000i32..800_000,
        spacing in 1i32..1_000,
        spread in 1i32..50_000,
    ) {
        let range = get_main_ticks(center, spacing, spread).unwrap();
        prop_assert!(range.tick_lower < range.tick_upper);
        prop_assert_eq!(range.tick_lower % spacing, 0);
        prop_assert_eq!(range.tick_upper % spacing, 0);
        prop_assert!(range.tick_lower <= center - spread);
        prop_assert!(range.tick_upper >= center + spread);
    }

    #[test]
    fn prop_bid_and_ask_sit_either_side_of_center(
        center in -800_000i32..800_000,
        spacing in 1i32..1_000,
        spread in 0i32..50_000,
    ) {
        let bid = get_bid_ticks(center, spacing, spread).unwrap();
        let ask = get_ask_ticks(center, spacing, spread).unwrap();
        prop_assert!(bid.tick_upper <= center);
        prop_assert!(ask.tick_lower > center);
        prop_assert!(bid.tick_upper < ask.tick_lower);
        prop_assert!(bid.validate(spacing).is_ok());
        prop_assert!(ask.validate(spacing).is_ok());
    }

    #[test]
    fn prop_tick_round_trips_through_sqrt_ratio(tick in MIN_TICK..MAX_TICK) {
        let sqrt_ratio = sqrt_ratio_at_tick(tick).unwrap();
        prop_assert_eq!(tick_at_sqrt_ratio(sqrt_ratio).unwrap(), tick);
        prop_assert!(sqrt_ratio_at_tick(tick + 1).unwrap() > sqrt_ratio);
    }

    #[test]
    fn prop_minted_liquidity_is_affordable(
        price_tick in -100_000i32..100_000,
        lower in -100_000i32..100_000,
        width in 1i32..20_000,
        amount0 in 0u128..1_000_000_000_000_000_000_000_000_000_000,
        amount1 in 0u128..1_000_000_000_000_000_000_000_000_000_000,
    ) {
        let sqrt_price = sqrt_ratio_at_tick(price_tick).unwrap();
        let sqrt_a = sqrt_ratio_at_tick(lower).unwrap();
        let sqrt_b = sqrt_ratio_at_tick(lower + width).unwrap();

        let liquidity =
            get_liquidity_for_amounts(sqrt_price, sqrt_a, sqrt_b, amount0, amount1).unwrap();
        let (cost0, cost1) =
            get_amounts_for_liquidity(sqrt_price, sqrt_a, sqrt_b, liquidity, Rounding::Up).unwrap();
        prop_assert!(cost0 <= amount0, "needs {} token0, has {}", cost0, amount0);
        prop_assert!(cost1 <= amount1, "needs {} token1, has {}", cost1, amount1);

        let (owed0, owed1) =
            get_amounts_for_liquidity(sqrt_price, sqrt_a, sqrt_b, liquidity, Rounding::Down)
                .unwrap();
        prop_assert!(owed0 <= cost0 && owed1 <= cost1);
    }

    #[test]
    fn prop_position_keys_are_distinct(
        owner_a in any::<[u8; 20]>(),
        owner_b in any::<[u8; 20]>(),
        lower_a in MIN_TICK..MAX_TICK,
        lower_b in MIN_TICK..MAX_TICK,
        upper_a in MIN_TICK..=MAX_TICK,
        upper_b in MIN_TICK..=MAX_TICK,
    ) {
        let a = (Address::from(owner_a), lower_a, upper_a);
        let b = (Address::from(owner_b), lower_b, upper_b);
        let key_a = position_key(a.0, a.1, a.2);
        prop_assert_eq!(key_a, position_key(a.0, a.1, a.2));
        if a != b {
            prop_assert_ne!(key_a, position_key(b.0, b.1, b.2));
        }
    }
}
