//! Error types for the keeper service

use lixir_core::VaultError;
use lixir_simulation::SimulationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown vault: {0}")]
    UnknownVault(String),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Rebalance of {vault} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        vault: String,
        attempts: u32,
        last: VaultError,
    },

    #[error("Unhealthy: {0}")]
    Unhealthy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for KeeperError {
    fn from(err: serde_json::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for KeeperError {
    fn from(err: toml::de::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}

impl From<toml::ser::Error> for KeeperError {
    fn from(err: toml::ser::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}

impl KeeperError {
    /// True when the same call may succeed once the market settles
    pub fn is_transient(&self) -> bool {
        matches!(self, KeeperError::Vault(err) if err.is_transient())
    }
}

pub type KeeperResult<T> = Result<T, KeeperError>;
