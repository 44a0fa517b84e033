//! # Mathematical Functions
//!
//! Pure functions for tick rounding, sqrt-price conversion, liquidity amounts and
//! fee valuation.

pub mod big_int;
pub mod fee_math;
pub mod liquidity_math;
pub mod tick_math;

// Re-export commonly used functions
pub use big_int::*;
pub use fee_math::*;
pub use liquidity_math::*;
pub use tick_math::*;
