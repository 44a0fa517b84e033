//! # Accounting Types
//!
//! Inputs and outputs of vault deposits, withdrawals and rebalances.

use alloy_primitives::Address;

use crate::types::position::TickRange;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Vault holdings valued at a single price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct Totals {
    /// Token0 held in positions plus idle token0
    pub total0: u128,
    /// Token1 held in positions plus idle token1
    pub total1: u128,
    /// Liquidity of the main position
    pub main_liquidity: u128,
    /// Liquidity of the range position
    pub range_liquidity: u128,
}

/// Parameters of a deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct DepositParams {
    pub amount0_desired: u128,
    pub amount1_desired: u128,
    pub amount0_min: u128,
    pub amount1_min: u128,
    /// Receives the minted shares
    pub recipient: Address,
    /// Unix timestamp after which the deposit fails
    pub deadline: u64,
}

/// Parameters of a withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct WithdrawParams {
    pub shares: u128,
    pub amount0_min: u128,
    pub amount1_min: u128,
    /// Receives the withdrawn tokens
    pub recipient: Address,
    pub deadline: u64,
}

/// Parameters of a native-currency deposit. The non-native side uses the
/// vault's other token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct NativeDepositParams {
    pub native_desired: u128,
    pub token_desired: u128,
    pub native_min: u128,
    pub token_min: u128,
    pub recipient: Address,
    pub deadline: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct DepositReceipt {
    pub shares: u128,
    pub amount0: u128,
    pub amount1: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct WithdrawReceipt {
    pub amount0: u128,
    pub amount1: u128,
}

/// Outcome of a completed rebalance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct RebalanceReport {
    pub gwap_tick: i32,
    pub main: TickRange,
    pub range: TickRange,
    pub main_liquidity: u128,
    pub range_liquidity: u128,
    /// Swap fees collected from the previous positions
    pub fees0: u128,
    pub fees1: u128,
    /// Shares minted to the fee recipient
    pub fee_shares: u128,
    /// Token balances left idle after redeployment
    pub idle0: u128,
    pub idle1: u128,
}
