//! Strategy-driven repositioning and the emergency exit.

use alloy_primitives::Address;

use crate::errors::{CoreResult, VaultError};
use crate::math::{performance_fee_shares, value_in_token1};
use crate::pool::Pool;
use crate::registry::{Registry, Role};
use crate::types::{RebalanceReport, TickRange};
use crate::vault::deposit::affordable_liquidity;
use crate::vault::{StrategyCapability, Vault};

/// New positions chosen by a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositionPlan {
    pub gwap_tick: i32,
    pub main: TickRange,
    /// Range below the price, funded with token1
    pub bid: TickRange,
    /// Range above the price, funded with token0
    pub ask: TickRange,
}

impl Vault {
    /// Set the main position of a vault that holds no liquidity yet
    pub fn initialize_positions<P: Pool + ?Sized>(
        &mut self,
        pool: &P,
        capability: &StrategyCapability,
        main: TickRange,
    ) -> CoreResult<()> {
        self.check_capability(capability)?;
        self.check_pool(pool)?;
        main.validate(self.tick_spacing)?;
        if self.main_liquidity(pool) > 0 || self.range_liquidity(pool) > 0 {
            return Ok(());
        }
        self.main = main;
        self.range = TickRange::UNSET;
        Ok(())
    }

    /// Pull all liquidity, charge the performance fee on collected swap fees and
    /// redeploy into `plan`.
    ///
    /// The main position takes as much of the idle balances as it can; the
    /// leftover goes to whichever of the bid or ask range it funds more liquidity
    /// in. If neither gets any, the range position is unset.
    pub fn rebalance<P, R>(
        &mut self,
        pool: &mut P,
        registry: &R,
        capability: &StrategyCapability,
        plan: RepositionPlan,
    ) -> CoreResult<RebalanceReport>
    where
        P: Pool,
        R: Registry + ?Sized,
    {
        self.check_capability(capability)?;
        self.check_pool(pool)?;
        self.check_active()?;
        for range in [plan.main, plan.bid, plan.ask] {
            range.validate(self.tick_spacing)?;
        }

        self.transact(pool, |vault, pool| {
            let (burned, collected) = vault.withdraw_all(pool)?;
            let fees0 = collected.0.saturating_sub(burned.0);
            let fees1 = collected.1.saturating_sub(burned.1);

            let sqrt_price_x96 = pool.slot0().sqrt_price_x96;
            let fee_shares = match registry.fee_to() {
                Some(fee_to) => {
                    let growth = value_in_token1(sqrt_price_x96, fees0, fees1)?;
                    let (idle0, idle1) = vault.idle_balances(pool);
                    let total_value = value_in_token1(sqrt_price_x96, idle0, idle1)?;
                    let shares = performance_fee_shares(
                        vault.total_supply(),
                        vault.performance_fee,
                        growth,
                        total_value,
                    )?;
                    if shares > 0 {
                        vault.shares.mint(fee_to, shares)?;
                        log::info!(
                            "Vault {} minted {} fee shares to {}",
                            vault.address,
                            shares,
                            fee_to
                        );
                    }
                    shares
                }
                None => 0,
            };

            vault.main = plan.main;
            let (idle0, idle1) = vault.idle_balances(pool);
            let main_liquidity = affordable_liquidity(sqrt_price_x96, plan.main, idle0, idle1)?;
            vault.mint_liquidity(pool, plan.main, main_liquidity)?;

            let (idle0, idle1) = vault.idle_balances(pool);
            let bid_liquidity = affordable_liquidity(sqrt_price_x96, plan.bid, idle0, idle1)?;
            let ask_liquidity = affordable_liquidity(sqrt_price_x96, plan.ask, idle0, idle1)?;
            let (range, range_liquidity) = if bid_liquidity == 0 && ask_liquidity == 0 {
                (TickRange::UNSET, 0)
            } else if bid_liquidity >= ask_liquidity {
                (plan.bid, bid_liquidity)
            } else {
                (plan.ask, ask_liquidity)
            };
            vault.range = range;
            vault.mint_liquidity(pool, range, range_liquidity)?;

            let (idle0, idle1) = vault.idle_balances(pool);
            log::info!(
                "Rebalanced vault {} at gwap {}: main {} ({}), range {} ({})",
                vault.address,
                plan.gwap_tick,
                plan.main,
                main_liquidity,
                range,
                range_liquidity
            );
            Ok(RebalanceReport {
                gwap_tick: plan.gwap_tick,
                main: plan.main,
                range,
                main_liquidity,
                range_liquidity,
                fees0,
                fees1,
                fee_shares,
                idle0,
                idle1,
            })
        })
    }

    /// Pull every position into idle balances and pause the vault
    pub fn emergency_exit<P, R>(
        &mut self,
        pool: &mut P,
        registry: &R,
        caller: Address,
    ) -> CoreResult<()>
    where
        P: Pool,
        R: Registry + ?Sized,
    {
        registry.require_role(Role::Pauser, caller)?;
        self.check_pool(pool)?;
        self.check_active()?;

        self.transact(pool, |vault, pool| {
            let (_, collected) = vault.withdraw_all(pool)?;
            vault.paused = true;
            log::warn!(
                "Emergency exit of vault {}: collected ({}, {})",
                vault.address,
                collected.0,
                collected.1
            );
            Ok(())
        })
    }

    /// Mint into idle balances' worth of main liquidity, then the leftover into
    /// the range position if one is set
    pub(crate) fn deploy_idle<P: Pool>(&mut self, pool: &mut P) -> CoreResult<()> {
        let sqrt_price_x96 = pool.slot0().sqrt_price_x96;
        for range in [self.main, self.range] {
            let (idle0, idle1) = self.idle_balances(pool);
            let liquidity = affordable_liquidity(sqrt_price_x96, range, idle0, idle1)?;
            self.mint_liquidity(pool, range, liquidity)?;
        }
        Ok(())
    }

    pub(crate) fn mint_liquidity<P: Pool>(
        &self,
        pool: &mut P,
        range: TickRange,
        liquidity: u128,
    ) -> CoreResult<()> {
        if liquidity == 0 || !range.is_set() {
            return Ok(());
        }
        pool.mint(self.address, range, liquidity)?;
        Ok(())
    }

    /// Burn all liquidity and collect everything owed into the vault account.
    /// Returns the burned principal and the total collected.
    fn withdraw_all<P: Pool>(&self, pool: &mut P) -> CoreResult<((u128, u128), (u128, u128))> {
        let mut burned = (0u128, 0u128);
        let mut collected = (0u128, 0u128);
        for range in [self.main, self.range] {
            if !range.is_set() {
                continue;
            }
            let liquidity = self.liquidity_in(pool, range);
            if liquidity > 0 {
                let (amount0, amount1) = pool.burn(self.address, range, liquidity)?;
                burned.0 = burned.0.checked_add(amount0).ok_or(VaultError::MathOverflow)?;
                burned.1 = burned.1.checked_add(amount1).ok_or(VaultError::MathOverflow)?;
            }
            let (amount0, amount1) =
                pool.collect(self.address, self.address, range, u128::MAX, u128::MAX)?;
            collected.0 = collected.0.checked_add(amount0).ok_or(VaultError::MathOverflow)?;
            collected.1 = collected.1.checked_add(amount1).ok_or(VaultError::MathOverflow)?;
        }
        Ok((burned, collected))
    }
}
