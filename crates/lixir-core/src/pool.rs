//! # Pool Interfaces
//!
//! The vault never implements an AMM. It reads prices and positions from, and
//! moves tokens and liquidity through, an implementation of [`Pool`]. The pool is
//! the ledger of record for token custody: idle vault balances are simply the
//! vault account's token balances.

use alloy_primitives::{Address, B256};

use crate::errors::CoreResult;
use crate::types::{PositionInfo, Slot0, TickRange};

/// Token balances and allowances
pub trait TokenCustody {
    fn balance_of(&self, token: Address, account: Address) -> u128;

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> u128;

    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: u128);

    /// Move `amount` of `token` from `from` to `to`
    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: u128)
        -> CoreResult<()>;

    /// Move `amount` on behalf of `from`, spending the allowance granted to `spender`
    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> CoreResult<()>;
}

/// Source of the current time
pub trait Clock {
    /// Unix timestamp in seconds
    fn now(&self) -> u64;
}

/// Concentrated-liquidity pool consumed by a vault
pub trait Pool: TokenCustody + Clock {
    /// Opaque saved state used to undo a failed multi-step operation
    type Snapshot;

    fn address(&self) -> Address;
    fn token0(&self) -> Address;
    fn token1(&self) -> Address;
    /// Swap fee in hundredths of a bip
    fn fee(&self) -> u32;
    fn tick_spacing(&self) -> i32;
    fn slot0(&self) -> Slot0;

    /// Position stored under `key`; an unknown key is an empty position
    fn position(&self, key: B256) -> PositionInfo;

    /// Tick cumulatives `seconds_agos[i]` seconds before now
    fn observe(&self, seconds_agos: &[u32]) -> CoreResult<Vec<i64>>;

    /// Add liquidity to `owner`'s position, paying from `owner`'s balances.
    /// Returns the amounts paid, rounded up.
    fn mint(&mut self, owner: Address, range: TickRange, liquidity: u128)
        -> CoreResult<(u128, u128)>;

    /// Remove liquidity, crediting the amounts (rounded down) to tokens owed
    fn burn(&mut self, owner: Address, range: TickRange, liquidity: u128)
        -> CoreResult<(u128, u128)>;

    /// Pay up to the requested amounts of tokens owed to `recipient`
    fn collect(
        &mut self,
        owner: Address,
        recipient: Address,
        range: TickRange,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> CoreResult<(u128, u128)>;

    fn snapshot(&self) -> Self::Snapshot;

    fn restore(&mut self, snapshot: Self::Snapshot);
}

/// Native currency and its wrapped token
pub trait NativeCurrency: TokenCustody {
    fn wrapped_native(&self) -> Address;

    fn native_balance(&self, account: Address) -> u128;

    /// Convert `account`'s native currency into the wrapped token
    fn wrap_native(&mut self, account: Address, amount: u128) -> CoreResult<()>;

    /// Convert `account`'s wrapped token back into native currency
    fn unwrap_native(&mut self, account: Address, amount: u128) -> CoreResult<()>;
}

/// Run `op` against `pool`, restoring the pool if it fails
pub fn atomically<P, T>(pool: &mut P, op: impl FnOnce(&mut P) -> CoreResult<T>) -> CoreResult<T>
where
    P: Pool,
{
    let snapshot = pool.snapshot();
    match op(pool) {
        Ok(value) => Ok(value),
        Err(err) => {
            pool.restore(snapshot);
            Err(err)
        }
    }
}
