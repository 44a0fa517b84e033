//! # Core Type Definitions
//!
//! Plain data shared by the vault, the strategy and pool implementations.

pub mod accounting;
pub mod position;

// Re-export all types
pub use accounting::*;
pub use position::*;
