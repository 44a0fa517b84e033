//! # Oracle Module
//!
//! The strategy reads a smoothed tick (GWAP) through [`TickOracle`]. The default
//! implementation, [`PoolOracle`], derives it from the pool's tick cumulatives;
//! tests can substitute any other implementation.

pub mod gwap;

pub use gwap::*;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreResult;

/// A tick cumulative and the time it was sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct OracleCheckpoint {
    pub tick_cumulative: i64,
    pub timestamp: u64,
}

/// Smoothed price signal
pub trait TickOracle {
    /// Mean tick over the trailing `duration` seconds
    fn observe_mean_tick(&self, duration: u32) -> CoreResult<i32>;

    /// Current tick cumulative
    fn latest_cumulative(&self) -> CoreResult<OracleCheckpoint>;
}
