//! # Core Error Types
//!
//! Every vault, strategy and pool operation returns [`CoreResult`]. A failed
//! operation leaves no partial mutation behind; retry policy belongs to the caller.

use thiserror::Error;

use crate::registry::Role;

/// Errors raised by vault, strategy and pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum VaultError {
    // ========================================================================
    // Math Errors
    // ========================================================================
    #[error("Math overflow")]
    MathOverflow,

    #[error("Math underflow")]
    MathUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Mul div overflow")]
    MulDivOverflow,

    #[error("Conversion error")]
    ConversionError,

    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Invalid tick: {0}")]
    InvalidTick(i32),

    #[error("Invalid sqrt price")]
    InvalidSqrtPrice,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ========================================================================
    // Ledger Errors
    // ========================================================================
    #[error("Deadline expired: deadline {deadline}, now {now}")]
    DeadlineExpired { deadline: u64, now: u64 },

    #[error("Slippage exceeded")]
    SlippageExceeded,

    #[error("ALLOWANCE")]
    AllowanceExceeded,

    #[error("Insufficient shares")]
    InsufficientShares,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Max supply exceeded")]
    MaxSupplyExceeded,

    // ========================================================================
    // Rebalance Errors
    // ========================================================================
    #[error("Tick {observed_tick} too far from gwap {gwap_tick} (max diff {max_tick_diff})")]
    ManipulationSuspected {
        gwap_tick: i32,
        observed_tick: i32,
        max_tick_diff: i32,
    },

    #[error("Vault not configured for this strategy")]
    NotConfigured,

    #[error("Oracle observation too old: {seconds_ago}s")]
    OracleObservationTooOld { seconds_ago: u32 },

    #[error("Position not found")]
    PositionNotFound,

    // ========================================================================
    // Authorization and Lifecycle Errors
    // ========================================================================
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    #[error("Missing role {role:?}")]
    MissingRole { role: Role },

    #[error("Pausable: paused")]
    Paused,

    #[error("Pausable: not paused")]
    NotPaused,

    #[error("Vault does not hold the wrapped native token")]
    NativeUnsupported,
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, VaultError>;

// Helper functions for creating specific errors
impl VaultError {
    /// Create a configuration error with reason
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::ConfigurationError(reason.into())
    }

    /// Create an authorization error with reason
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::AuthorizationError(reason.into())
    }

    /// True for errors a keeper may retry after the market settles
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ManipulationSuspected { .. } | Self::OracleObservationTooOld { .. }
        )
    }

    /// True for authorization failures, including missing roles
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::AuthorizationError(_) | Self::MissingRole { .. })
    }
}
