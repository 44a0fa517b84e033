//! # Lixir Core - Vault Logic
//!
//! This crate contains the vault logic that sits on top of a concentrated-liquidity
//! pool. It provides:
//!
//! - Tick arithmetic for turning a price signal plus a spread into position bounds
//! - Liquidity math compatible with the pool's own rounding
//! - The share ledger governing deposits, withdrawals and performance fees
//! - The GWAP strategy that rebalances a vault's main and range positions
//!
//! The pool, the tick-cumulative oracle and the role registry are consumed through
//! the traits in [`pool`], [`oracle`] and [`registry`].
//!
//! ## Feature Flags
//!
//! - `client`: Enables standard serialization for off-chain use

pub mod constants;
pub mod errors;
pub mod ledger;
pub mod math;
pub mod oracle;
pub mod pool;
pub mod position_key;
pub mod registry;
pub mod strategy;
pub mod types;
pub mod vault;

// Re-export commonly used items
pub use alloy_primitives::{Address, B256, U256};
pub use constants::*;
pub use errors::{CoreResult, VaultError};
pub use ledger::ShareLedger;
pub use oracle::{OracleCheckpoint, PoolOracle, TickOracle};
pub use pool::{Clock, NativeCurrency, Pool, TokenCustody};
pub use position_key::position_key;
pub use registry::{Registry, Role, RoleRegistry};
pub use strategy::{GwapStrategy, StrategyParams, VaultData};
pub use types::*;
pub use vault::{StrategyCapability, Vault, VaultParams};
