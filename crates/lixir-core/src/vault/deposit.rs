//! Deposits: pricing new shares against the vault's holdings and adding the
//! depositor's tokens to the positions pro rata.

use alloy_primitives::{Address, U256};

use crate::errors::{CoreResult, VaultError};
use crate::math::{get_liquidity_for_amounts, mul_div_u128, sqrt_ratios_for_range, Rounding};
use crate::pool::Pool;
use crate::types::{DepositParams, DepositReceipt, TickRange};
use crate::vault::{check_deadline, Vault};

/// Shares and amounts a deposit resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DepositQuote {
    pub shares: u128,
    pub amount0: u128,
    pub amount1: u128,
    pub main_liquidity: u128,
    pub range_liquidity: u128,
    pub bootstrap: bool,
}

impl Vault {
    /// Deposit from `caller`'s own balances
    pub fn deposit<P: Pool>(
        &mut self,
        pool: &mut P,
        caller: Address,
        params: DepositParams,
    ) -> CoreResult<DepositReceipt> {
        let (token0, token1, vault) = (self.token0, self.token1, self.address);
        self.execute_deposit(pool, &params, |pool, amount0, amount1| {
            pool.transfer(token0, caller, vault, amount0)?;
            pool.transfer(token1, caller, vault, amount1)
        })
    }

    /// Deposit tokens pulled from `owner` using the token allowances `owner`
    /// granted to `caller`
    pub fn deposit_from<P: Pool>(
        &mut self,
        pool: &mut P,
        caller: Address,
        owner: Address,
        params: DepositParams,
    ) -> CoreResult<DepositReceipt> {
        let (token0, token1, vault) = (self.token0, self.token1, self.address);
        self.execute_deposit(pool, &params, |pool, amount0, amount1| {
            for (token, amount) in [(token0, amount0), (token1, amount1)] {
                if pool.allowance(token, owner, caller) < amount {
                    return Err(VaultError::AllowanceExceeded);
                }
                pool.transfer_from(token, caller, owner, vault, amount)?;
            }
            Ok(())
        })
    }

    /// Shared deposit flow. `pay` moves the quoted amounts into the vault account.
    pub(crate) fn execute_deposit<P, F>(
        &mut self,
        pool: &mut P,
        params: &DepositParams,
        pay: F,
    ) -> CoreResult<DepositReceipt>
    where
        P: Pool,
        F: FnOnce(&mut P, u128, u128) -> CoreResult<()>,
    {
        self.check_pool(pool)?;
        check_deadline(pool.now(), params.deadline)?;
        self.check_active()?;

        self.transact(pool, |vault, pool| {
            let quote = vault.quote_deposit(pool, params.amount0_desired, params.amount1_desired)?;
            if quote.amount0 < params.amount0_min || quote.amount1 < params.amount1_min {
                return Err(VaultError::SlippageExceeded);
            }
            let new_supply = vault
                .total_supply()
                .checked_add(quote.shares)
                .ok_or(VaultError::MathOverflow)?;
            if vault.max_supply != 0 && new_supply > vault.max_supply {
                return Err(VaultError::MaxSupplyExceeded);
            }

            pay(pool, quote.amount0, quote.amount1)?;
            vault.shares.mint(params.recipient, quote.shares)?;

            if quote.bootstrap {
                vault.deploy_idle(pool)?;
            } else {
                vault.add_liquidity_capped(pool, vault.main, quote.main_liquidity)?;
                vault.add_liquidity_capped(pool, vault.range, quote.range_liquidity)?;
            }

            log::debug!(
                "Deposit into {}: {} shares for ({}, {}) to {}",
                vault.address,
                quote.shares,
                quote.amount0,
                quote.amount1,
                params.recipient
            );
            Ok(DepositReceipt {
                shares: quote.shares,
                amount0: quote.amount0,
                amount1: quote.amount1,
            })
        })
    }

    /// Price a deposit of at most the desired amounts.
    ///
    /// Positions are valued rounding up so a depositor never receives shares
    /// worth more than the tokens taken.
    pub(crate) fn quote_deposit<P: Pool + ?Sized>(
        &self,
        pool: &P,
        amount0_desired: u128,
        amount1_desired: u128,
    ) -> CoreResult<DepositQuote> {
        let supply = self.total_supply();
        if supply == 0 {
            let shares = amount0_desired.max(amount1_desired);
            if shares == 0 {
                return Err(VaultError::InvalidAmount);
            }
            return Ok(DepositQuote {
                shares,
                amount0: amount0_desired,
                amount1: amount1_desired,
                main_liquidity: 0,
                range_liquidity: 0,
                bootstrap: true,
            });
        }

        let totals = self.totals_at(pool, pool.slot0().sqrt_price_x96, Rounding::Up)?;
        // A token the vault holds none of does not constrain the deposit
        let mut shares: Option<u128> = None;
        let pairs = [(amount0_desired, totals.total0), (amount1_desired, totals.total1)];
        for (desired, total) in pairs {
            if total == 0 {
                continue;
            }
            let candidate = mul_div_u128(desired, supply, total, Rounding::Down)?;
            shares = Some(shares.map_or(candidate, |current| current.min(candidate)));
        }
        let shares = shares.unwrap_or(0);
        if shares == 0 {
            return Err(VaultError::InvalidAmount);
        }

        Ok(DepositQuote {
            shares,
            amount0: mul_div_u128(totals.total0, shares, supply, Rounding::Up)?,
            amount1: mul_div_u128(totals.total1, shares, supply, Rounding::Up)?,
            main_liquidity: mul_div_u128(totals.main_liquidity, shares, supply, Rounding::Down)?,
            range_liquidity: mul_div_u128(totals.range_liquidity, shares, supply, Rounding::Down)?,
            bootstrap: false,
        })
    }

    /// Mint up to `liquidity` into `range`, limited by what the idle balances fund
    fn add_liquidity_capped<P: Pool>(
        &self,
        pool: &mut P,
        range: TickRange,
        liquidity: u128,
    ) -> CoreResult<u128> {
        if liquidity == 0 || !range.is_set() {
            return Ok(0);
        }
        let (idle0, idle1) = self.idle_balances(pool);
        let affordable = affordable_liquidity(pool.slot0().sqrt_price_x96, range, idle0, idle1)?;
        let liquidity = liquidity.min(affordable);
        self.mint_liquidity(pool, range, liquidity)?;
        Ok(liquidity)
    }
}

/// Maximum liquidity `(amount0, amount1)` funds over `range` at `sqrt_price_x96`
pub(crate) fn affordable_liquidity(
    sqrt_price_x96: U256,
    range: TickRange,
    amount0: u128,
    amount1: u128,
) -> CoreResult<u128> {
    if !range.is_set() {
        return Ok(0);
    }
    let (sqrt_lower, sqrt_upper) = sqrt_ratios_for_range(&range)?;
    get_liquidity_for_amounts(sqrt_price_x96, sqrt_lower, sqrt_upper, amount0, amount1)
}
