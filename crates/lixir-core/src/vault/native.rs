//! Native-currency entry points for vaults paired with the wrapped native token.

use alloy_primitives::Address;

use crate::errors::{CoreResult, VaultError};
use crate::pool::{NativeCurrency, Pool};
use crate::types::{
    DepositParams, DepositReceipt, NativeDepositParams, WithdrawParams, WithdrawReceipt,
};
use crate::vault::Vault;

impl Vault {
    /// Whether the wrapped native token is token0; `NativeUnsupported` if the
    /// pair does not contain it.
    pub fn native_is_token0<P: NativeCurrency + ?Sized>(&self, pool: &P) -> CoreResult<bool> {
        let wrapped = pool.wrapped_native();
        if wrapped == self.token0 {
            Ok(true)
        } else if wrapped == self.token1 {
            Ok(false)
        } else {
            Err(VaultError::NativeUnsupported)
        }
    }

    /// Deposit native currency plus the paired token. Only the native amount the
    /// deposit uses is wrapped.
    pub fn deposit_native<P: Pool + NativeCurrency>(
        &mut self,
        pool: &mut P,
        caller: Address,
        params: NativeDepositParams,
    ) -> CoreResult<DepositReceipt> {
        let native_is_token0 = self.native_is_token0(pool)?;
        let deposit = if native_is_token0 {
            DepositParams {
                amount0_desired: params.native_desired,
                amount1_desired: params.token_desired,
                amount0_min: params.native_min,
                amount1_min: params.token_min,
                recipient: params.recipient,
                deadline: params.deadline,
            }
        } else {
            DepositParams {
                amount0_desired: params.token_desired,
                amount1_desired: params.native_desired,
                amount0_min: params.token_min,
                amount1_min: params.native_min,
                recipient: params.recipient,
                deadline: params.deadline,
            }
        };
        if pool.native_balance(caller) < params.native_desired {
            return Err(VaultError::InsufficientBalance);
        }

        let (token0, token1, vault) = (self.token0, self.token1, self.address);
        self.execute_deposit(pool, &deposit, |pool, amount0, amount1| {
            let native_used = if native_is_token0 { amount0 } else { amount1 };
            pool.wrap_native(caller, native_used)?;
            pool.transfer(token0, caller, vault, amount0)?;
            pool.transfer(token1, caller, vault, amount1)
        })
    }

    /// Withdraw and deliver the wrapped side as native currency
    pub fn withdraw_native<P: Pool + NativeCurrency>(
        &mut self,
        pool: &mut P,
        caller: Address,
        params: WithdrawParams,
    ) -> CoreResult<WithdrawReceipt> {
        let native_is_token0 = self.native_is_token0(pool)?;
        self.execute_withdraw(pool, caller, None, &params, |pool, receipt| {
            unwrap_proceeds(pool, params.recipient, native_is_token0, receipt)
        })
    }

    /// [`Vault::withdraw_native`] on behalf of `owner`, spending `caller`'s share allowance
    pub fn withdraw_native_from<P: Pool + NativeCurrency>(
        &mut self,
        pool: &mut P,
        caller: Address,
        owner: Address,
        params: WithdrawParams,
    ) -> CoreResult<WithdrawReceipt> {
        let native_is_token0 = self.native_is_token0(pool)?;
        self.execute_withdraw(pool, owner, Some(caller), &params, |pool, receipt| {
            unwrap_proceeds(pool, params.recipient, native_is_token0, receipt)
        })
    }
}

fn unwrap_proceeds<P: NativeCurrency>(
    pool: &mut P,
    recipient: Address,
    native_is_token0: bool,
    receipt: &WithdrawReceipt,
) -> CoreResult<()> {
    let amount = if native_is_token0 {
        receipt.amount0
    } else {
        receipt.amount1
    };
    if amount == 0 {
        return Ok(());
    }
    pool.unwrap_native(recipient, amount)
}
