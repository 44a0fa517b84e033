//! # Protocol Constants
//!
//! Tick and price bounds shared with the underlying pool, fee precision and the
//! default strategy parameters used when a vault is deployed.

use alloy_primitives::U256;

// ============================================================================
// Mathematical Constants
// ============================================================================

/// Q96 fixed-point scale factor: 2^96
pub const Q96: u128 = 1u128 << 96;

/// Number of fractional bits in a Q64.96 sqrt price
pub const RESOLUTION: usize = 96;

// ============================================================================
// Tick Bounds
// ============================================================================

/// Minimum tick supported by the pool
pub const MIN_TICK: i32 = -887_272;

/// Maximum tick supported by the pool
pub const MAX_TICK: i32 = 887_272;

/// Ticks are stored by the pool as int24
pub const TICK_BYTES: usize = 3;

/// sqrt_ratio_at_tick(MIN_TICK)
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4_295_128_739, 0, 0, 0]);

/// sqrt_ratio_at_tick(MAX_TICK)
pub const MAX_SQRT_RATIO: U256 =
    U256::from_limbs([0x5d95_1d52_6398_8d26, 0xefd1_fc6a_5064_8849, 0xfffd_8963, 0]);

// ============================================================================
// Fee Constants
// ============================================================================

/// Denominator for the vault performance fee
pub const PERFORMANCE_FEE_PRECISION: u32 = 1_000_000;

/// Maximum performance fee (50%)
pub const MAX_PERFORMANCE_FEE: u32 = 500_000;

/// Denominator for pool swap fees (hundredths of a bip)
pub const POOL_FEE_PRECISION: u32 = 1_000_000;

// ============================================================================
// Strategy Defaults
// ============================================================================

/// Default GWAP window in seconds
pub const DEFAULT_TICK_SHORT_DURATION: u32 = 60;

/// Default manipulation tolerance in ticks
pub const DEFAULT_MAX_TICK_DIFF: i32 = 120;

/// Default half-width of the main position in ticks
pub const DEFAULT_MAIN_SPREAD: i32 = 1800;

/// Default width of the range position in ticks
pub const DEFAULT_RANGE_SPREAD: i32 = 900;

/// Largest spread or tick tolerance accepted by a strategy (int24 range)
pub const MAX_TICK_PARAMETER: i32 = (1 << 23) - 1;
