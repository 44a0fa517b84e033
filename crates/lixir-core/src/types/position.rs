//! # Position Types
//!
//! Tick ranges managed by a vault and the pool-side records they map to.

use alloy_primitives::U256;

use crate::constants::{MAX_TICK, MIN_TICK};
use crate::errors::{CoreResult, VaultError};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Lower and upper tick of a liquidity position. `(0, 0)` means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct TickRange {
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl TickRange {
    /// The unset position
    pub const UNSET: TickRange = TickRange {
        tick_lower: 0,
        tick_upper: 0,
    };

    pub const fn new(tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            tick_lower,
            tick_upper,
        }
    }

    pub fn is_set(&self) -> bool {
        *self != Self::UNSET
    }

    /// Check ordering, global bounds and spacing alignment.
    /// Bounds clamped at `MIN_TICK`/`MAX_TICK` are exempt from alignment.
    pub fn validate(&self, tick_spacing: i32) -> CoreResult<()> {
        if tick_spacing <= 0 {
            return Err(VaultError::configuration("tick spacing must be positive"));
        }
        if self.tick_lower >= self.tick_upper {
            return Err(VaultError::configuration(format!(
                "inverted tick range [{}, {}]",
                self.tick_lower, self.tick_upper
            )));
        }
        for tick in [self.tick_lower, self.tick_upper] {
            if !(MIN_TICK..=MAX_TICK).contains(&tick) {
                return Err(VaultError::InvalidTick(tick));
            }
            let clamped = tick == MIN_TICK || tick == MAX_TICK;
            if !clamped && tick.rem_euclid(tick_spacing) != 0 {
                return Err(VaultError::InvalidTick(tick));
            }
        }
        Ok(())
    }

    /// Whether `tick` lies inside `[tick_lower, tick_upper)`
    pub fn contains(&self, tick: i32) -> bool {
        self.tick_lower <= tick && tick < self.tick_upper
    }
}

impl std::fmt::Display for TickRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.tick_lower, self.tick_upper)
    }
}

/// Current price state of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct Slot0 {
    /// Q64.96 square root of token1/token0
    pub sqrt_price_x96: U256,
    /// Greatest tick whose sqrt ratio is <= `sqrt_price_x96`
    pub tick: i32,
}

/// Pool-side record of a position keyed by owner and bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PositionInfo {
    pub liquidity: u128,
    /// Burned principal and accrued fees not yet collected
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}
