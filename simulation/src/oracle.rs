//! # Tick Observations
//!
//! Ring buffer of tick cumulatives kept by the simulated pool. An observation is
//! written just before every price change, so between two observations the tick
//! was constant and any intermediate cumulative can be interpolated exactly.

use std::collections::VecDeque;

use lixir_core::{CoreResult, VaultError};

/// Maximum number of observations retained
pub const MAX_OBSERVATIONS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub timestamp: u64,
    /// Sum of `tick * seconds` up to `timestamp`
    pub tick_cumulative: i64,
}

#[derive(Debug, Clone)]
pub struct TickObservations {
    observations: VecDeque<Observation>,
}

impl TickObservations {
    /// Start recording at `timestamp` with a zero cumulative
    pub fn new(timestamp: u64) -> Self {
        let mut observations = VecDeque::with_capacity(MAX_OBSERVATIONS);
        observations.push_back(Observation {
            timestamp,
            tick_cumulative: 0,
        });
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    fn latest(&self) -> CoreResult<Observation> {
        self.observations
            .back()
            .copied()
            .ok_or(VaultError::OracleObservationTooOld { seconds_ago: 0 })
    }

    /// Close the interval during which the price sat at `tick`
    pub fn write(&mut self, timestamp: u64, tick: i32) -> CoreResult<()> {
        let latest = self.latest()?;
        if timestamp < latest.timestamp {
            return Err(VaultError::configuration("observation timestamps must not decrease"));
        }
        if timestamp == latest.timestamp {
            return Ok(());
        }

        let observation = Observation {
            timestamp,
            tick_cumulative: accumulate(latest, tick, timestamp)?,
        };
        if self.observations.len() == MAX_OBSERVATIONS {
            self.observations.pop_front();
        }
        self.observations.push_back(observation);
        Ok(())
    }

    /// Tick cumulative `seconds_ago` before `now`, given the price currently
    /// sits at `current_tick`
    pub fn observe(&self, now: u64, seconds_ago: u32, current_tick: i32) -> CoreResult<i64> {
        let too_old = VaultError::OracleObservationTooOld { seconds_ago };
        let target = now.checked_sub(u64::from(seconds_ago)).ok_or(too_old.clone())?;

        let latest = self.latest()?;
        if target >= latest.timestamp {
            return accumulate(latest, current_tick, target);
        }

        let first = self.observations.front().copied().ok_or(too_old.clone())?;
        if target < first.timestamp {
            return Err(too_old);
        }

        // Last observation at or before the target; the next one exists because
        // the target precedes the latest observation
        let index = self
            .observations
            .partition_point(|observation| observation.timestamp <= target)
            - 1;
        let before = self.observations[index];
        let after = self.observations[index + 1];
        if target == before.timestamp {
            return Ok(before.tick_cumulative);
        }

        let elapsed = i64::try_from(after.timestamp - before.timestamp)
            .map_err(|_| VaultError::ConversionError)?;
        let tick = (after.tick_cumulative - before.tick_cumulative) / elapsed;
        let tick = i32::try_from(tick).map_err(|_| VaultError::ConversionError)?;
        accumulate(before, tick, target)
    }
}

fn accumulate(from: Observation, tick: i32, timestamp: u64) -> CoreResult<i64> {
    let elapsed =
        i64::try_from(timestamp - from.timestamp).map_err(|_| VaultError::ConversionError)?;
    i64::from(tick)
        .checked_mul(elapsed)
        .and_then(|delta| from.tick_cumulative.checked_add(delta))
        .ok_or(VaultError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_current_interval() {
        let observations = TickObservations::new(1_000);
        assert_eq!(observations.observe(1_060, 0, 100).unwrap(), 6_000);
        assert_eq!(observations.observe(1_060, 60, 100).unwrap(), 0);
        assert_eq!(observations.observe(1_060, 30, -100).unwrap(), -3_000);
    }

    #[test]
    fn test_observe_interpolates_between_writes() {
        let mut observations = TickObservations::new(0);
        // Tick 10 for 100s, then -20 for 50s, then 5 until now
        observations.write(100, 10).unwrap();
        observations.write(150, -20).unwrap();

        assert_eq!(observations.observe(200, 0, 5).unwrap(), 1_000 - 1_000 + 250);
        assert_eq!(observations.observe(200, 75, 5).unwrap(), 1_000 - 500);
        assert_eq!(observations.observe(200, 150, 5).unwrap(), 500);
        assert_eq!(observations.observe(200, 100, 5).unwrap(), 1_000);
    }

    #[test]
    fn test_observe_before_history() {
        let observations = TickObservations::new(1_000);
        assert_eq!(
            observations.observe(1_030, 60, 0),
            Err(VaultError::OracleObservationTooOld { seconds_ago: 60 })
        );
        assert!(observations.observe(30, 60, 0).is_err());
    }

    #[test]
    fn test_same_timestamp_write_is_ignored() {
        let mut observations = TickObservations::new(0);
        observations.write(10, 1).unwrap();
        observations.write(10, 99).unwrap();
        assert_eq!(observations.len(), 2);
        assert!(observations.write(5, 1).is_err());
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mut observations = TickObservations::new(0);
        for t in 1..=(MAX_OBSERVATIONS as u64 + 10) {
            observations.write(t, 1).unwrap();
        }
        assert_eq!(observations.len(), MAX_OBSERVATIONS);
        assert!(observations.observe(MAX_OBSERVATIONS as u64 + 10, 1_030, 1).is_err());
        assert_eq!(
            observations.observe(MAX_OBSERVATIONS as u64 + 10, 5, 1).unwrap(),
            MAX_OBSERVATIONS as i64 + 5
        );
    }
}
