//! Simulation framework for testing Lixir vaults
//!
//! Provides:
//! - An in-memory concentrated-liquidity pool implementing the vault's pool traits
//! - Exact-input swaps and a tick-cumulative oracle on that pool
//! - Deterministic test accounts and a fully wired test environment
//! - A seeded scenario runner generating random order flow
//!
//! The pool is a test substrate, not an AMM: it has no tick bitmap and no
//! protocol fee.

pub mod account_factory;
pub mod market;
pub mod oracle;
pub mod scenario_runner;
pub mod swap_simulator;
pub mod test_environment;

pub use account_factory::{AccountFactory, TestAccounts};
pub use market::{PoolConfig, PoolPosition, SimulatedPool};
pub use oracle::TickObservations;
pub use scenario_runner::{ScenarioConfig, ScenarioReport, ScenarioRunner};
pub use swap_simulator::SwapExecution;
pub use test_environment::{EnvironmentConfig, TestEnvironment};

use lixir_core::VaultError;

/// Simulation error type
#[derive(thiserror::Error, Debug)]
pub enum SimulationError {
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Simulation result type
pub type SimulationResult<T> = std::result::Result<T, SimulationError>;
