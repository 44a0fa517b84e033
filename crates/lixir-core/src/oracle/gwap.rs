//! # GWAP
//!
//! Geometric (tick) time-weighted average price read from a pool's tick
//! cumulatives.

use crate::errors::{CoreResult, VaultError};
use crate::oracle::{OracleCheckpoint, TickOracle};
use crate::pool::Pool;

/// Mean tick between two cumulatives taken `duration` seconds apart,
/// rounded towards negative infinity.
pub fn mean_tick(cumulative_start: i64, cumulative_end: i64, duration: u32) -> CoreResult<i32> {
    if duration == 0 {
        return Err(VaultError::DivisionByZero);
    }
    let delta = cumulative_end
        .checked_sub(cumulative_start)
        .ok_or(VaultError::MathOverflow)?;
    let tick = delta.div_euclid(i64::from(duration));
    i32::try_from(tick).map_err(|_| VaultError::ConversionError)
}

/// [`TickOracle`] backed by a pool's `observe`
pub struct PoolOracle<'a, P: ?Sized> {
    pool: &'a P,
}

impl<'a, P: Pool + ?Sized> PoolOracle<'a, P> {
    pub fn new(pool: &'a P) -> Self {
        Self { pool }
    }
}

impl<P: Pool + ?Sized> TickOracle for PoolOracle<'_, P> {
    fn observe_mean_tick(&self, duration: u32) -> CoreResult<i32> {
        let cumulatives = self.pool.observe(&[duration, 0])?;
        match cumulatives.as_slice() {
            [start, end] => mean_tick(*start, *end, duration),
            _ => Err(VaultError::ConversionError),
        }
    }

    fn latest_cumulative(&self) -> CoreResult<OracleCheckpoint> {
        let cumulatives = self.pool.observe(&[0])?;
        let tick_cumulative = cumulatives.first().copied().ok_or(VaultError::ConversionError)?;
        Ok(OracleCheckpoint {
            tick_cumulative,
            timestamp: self.pool.now(),
        })
    }
}

/// Oracle reporting fixed values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTickOracle {
    pub tick: i32,
    pub checkpoint: OracleCheckpoint,
}

impl FixedTickOracle {
    pub fn new(tick: i32) -> Self {
        Self {
            tick,
            checkpoint: OracleCheckpoint::default(),
        }
    }
}

impl TickOracle for FixedTickOracle {
    fn observe_mean_tick(&self, _duration: u32) -> CoreResult<i32> {
        Ok(self.tick)
    }

    fn latest_cumulative(&self) -> CoreResult<OracleCheckpoint> {
        Ok(self.checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_tick_positive() {
        assert_eq!(mean_tick(0, 60 * 120, 60).unwrap(), 120);
        assert_eq!(mean_tick(1_000, 1_000 + 59, 60).unwrap(), 0);
    }

    #[test]
    fn test_mean_tick_rounds_toward_negative_infinity() {
        assert_eq!(mean_tick(0, -60 * 120, 60).unwrap(), -120);
        assert_eq!(mean_tick(0, -1, 60).unwrap(), -1);
        assert_eq!(mean_tick(0, -61, 60).unwrap(), -2);
    }

    #[test]
    fn test_mean_tick_zero_duration() {
        assert_eq!(mean_tick(0, 10, 0), Err(VaultError::DivisionByZero));
    }

    #[test]
    fn test_fixed_oracle() {
        let oracle = FixedTickOracle::new(-42);
        assert_eq!(oracle.observe_mean_tick(60).unwrap(), -42);
        assert_eq!(oracle.latest_cumulative().unwrap(), OracleCheckpoint::default());
    }
}
