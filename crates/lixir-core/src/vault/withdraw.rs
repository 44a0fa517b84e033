//! Withdrawals: burning shares for a pro-rata slice of every position and of the
//! idle balances. Withdrawals remain available while the vault is paused.

use alloy_primitives::Address;

use crate::errors::{CoreResult, VaultError};
use crate::math::{mul_div_u128, Rounding};
use crate::pool::Pool;
use crate::types::{WithdrawParams, WithdrawReceipt};
use crate::vault::{check_deadline, Vault};

impl Vault {
    /// Burn `caller`'s shares and send the proceeds to `params.recipient`
    pub fn withdraw<P: Pool>(
        &mut self,
        pool: &mut P,
        caller: Address,
        params: WithdrawParams,
    ) -> CoreResult<WithdrawReceipt> {
        self.execute_withdraw(pool, caller, None, &params, |_, _| Ok(()))
    }

    /// Burn `owner`'s shares, spending the share allowance `owner` granted to `caller`
    pub fn withdraw_from<P: Pool>(
        &mut self,
        pool: &mut P,
        caller: Address,
        owner: Address,
        params: WithdrawParams,
    ) -> CoreResult<WithdrawReceipt> {
        self.execute_withdraw(pool, owner, Some(caller), &params, |_, _| Ok(()))
    }

    /// Shared withdrawal flow. `settle` runs last, inside the same transaction.
    pub(crate) fn execute_withdraw<P, F>(
        &mut self,
        pool: &mut P,
        owner: Address,
        spender: Option<Address>,
        params: &WithdrawParams,
        settle: F,
    ) -> CoreResult<WithdrawReceipt>
    where
        P: Pool,
        F: FnOnce(&mut P, &WithdrawReceipt) -> CoreResult<()>,
    {
        self.check_pool(pool)?;
        check_deadline(pool.now(), params.deadline)?;
        if params.shares == 0 {
            return Err(VaultError::InvalidAmount);
        }
        if self.balance_of(owner) < params.shares {
            return Err(VaultError::InsufficientShares);
        }

        self.transact(pool, |vault, pool| {
            if let Some(spender) = spender {
                vault.shares.spend_allowance(owner, spender, params.shares)?;
            }

            let supply = vault.total_supply();
            let (idle0, idle1) = vault.idle_balances(pool);
            let idle_out0 = mul_div_u128(idle0, params.shares, supply, Rounding::Down)?;
            let idle_out1 = mul_div_u128(idle1, params.shares, supply, Rounding::Down)?;
            let (mut amount0, mut amount1) = (idle_out0, idle_out1);

            for range in [vault.main, vault.range] {
                let liquidity = vault.liquidity_in(pool, range);
                let burn = mul_div_u128(liquidity, params.shares, supply, Rounding::Down)?;
                if burn == 0 {
                    continue;
                }
                let (burned0, burned1) = pool.burn(vault.address, range, burn)?;
                let (collected0, collected1) =
                    pool.collect(vault.address, params.recipient, range, burned0, burned1)?;
                amount0 = amount0.checked_add(collected0).ok_or(VaultError::MathOverflow)?;
                amount1 = amount1.checked_add(collected1).ok_or(VaultError::MathOverflow)?;
            }

            pool.transfer(vault.token0, vault.address, params.recipient, idle_out0)?;
            pool.transfer(vault.token1, vault.address, params.recipient, idle_out1)?;

            if amount0 < params.amount0_min || amount1 < params.amount1_min {
                return Err(VaultError::SlippageExceeded);
            }
            vault.shares.burn(owner, params.shares)?;

            let receipt = WithdrawReceipt { amount0, amount1 };
            settle(pool, &receipt)?;

            log::debug!(
                "Withdraw from {}: {} shares of {} for ({}, {}) to {}",
                vault.address,
                params.shares,
                owner,
                amount0,
                amount1,
                params.recipient
            );
            Ok(receipt)
        })
    }
}
