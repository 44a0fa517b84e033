//! Off-chain keeper for Lixir vaults.
//!
//! Watches each configured vault, decides when its positions have drifted far
//! enough from the market to warrant a rebalance, and submits the rebalance with
//! retry and backoff on transient failures.

pub mod backend;
pub mod config;
pub mod error;
pub mod keeper;

pub use backend::{SimulatedBackend, VaultBackend, VaultStatus};
pub use config::{KeeperConfig, MarketConfig, RetryConfig, VaultConfig};
pub use error::{KeeperError, KeeperResult};
pub use keeper::{rebalance_reason, Keeper, KeeperStats, RebalanceReason, StatusReport};
