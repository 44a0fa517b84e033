//! # Vault
//!
//! A vault pools two tokens from many depositors into a main and a range
//! position on a single pool and issues shares against the pooled value.
//!
//! Every mutating operation runs against a pool snapshot: if any step fails the
//! pool and the vault are both restored, so callers never observe a partially
//! applied deposit, withdrawal or rebalance.

pub mod deposit;
pub mod native;
pub mod reposition;
pub mod totals;
pub mod withdraw;

pub use reposition::RepositionPlan;

use alloy_primitives::Address;

use crate::constants::MAX_PERFORMANCE_FEE;
use crate::errors::{CoreResult, VaultError};
use crate::ledger::ShareLedger;
use crate::pool::{atomically, Pool};
use crate::registry::{Registry, Role};
use crate::types::TickRange;

/// Construction parameters of a vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultParams {
    /// Account that holds the vault's idle tokens and owns its positions
    pub address: Address,
    pub name: String,
    pub symbol: String,
    /// Parts per `PERFORMANCE_FEE_PRECISION`
    pub performance_fee: u32,
}

/// Authority to reposition a vault, issued to its current strategy.
///
/// Only a vault can create one. A capability becomes stale as soon as the vault
/// changes strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyCapability {
    vault: Address,
    strategy: Address,
    epoch: u64,
}

impl StrategyCapability {
    pub(crate) fn new(vault: Address, strategy: Address, epoch: u64) -> Self {
        Self {
            vault,
            strategy,
            epoch,
        }
    }

    pub fn vault(&self) -> Address {
        self.vault
    }

    pub fn strategy(&self) -> Address {
        self.strategy
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone)]
pub struct Vault {
    address: Address,
    token0: Address,
    token1: Address,
    pool: Address,
    fee: u32,
    tick_spacing: i32,
    main: TickRange,
    range: TickRange,
    shares: ShareLedger,
    performance_fee: u32,
    strategy: Address,
    strategy_epoch: u64,
    /// Zero means unlimited
    max_supply: u128,
    paused: bool,
}

impl Vault {
    /// Create a vault on `pool` managed by `strategy`, returning the strategy's
    /// capability alongside it.
    pub fn new<P, R>(
        params: VaultParams,
        pool: &P,
        registry: &R,
        strategy: Address,
    ) -> CoreResult<(Self, StrategyCapability)>
    where
        P: Pool + ?Sized,
        R: Registry + ?Sized,
    {
        registry.require_role(Role::Strategy, strategy)?;
        if params.performance_fee > MAX_PERFORMANCE_FEE {
            return Err(VaultError::configuration(format!(
                "performance fee {} exceeds maximum {}",
                params.performance_fee, MAX_PERFORMANCE_FEE
            )));
        }
        if pool.tick_spacing() <= 0 {
            return Err(VaultError::configuration("pool tick spacing must be positive"));
        }

        let vault = Self {
            address: params.address,
            token0: pool.token0(),
            token1: pool.token1(),
            pool: pool.address(),
            fee: pool.fee(),
            tick_spacing: pool.tick_spacing(),
            main: TickRange::UNSET,
            range: TickRange::UNSET,
            shares: ShareLedger::new(params.name, params.symbol),
            performance_fee: params.performance_fee,
            strategy,
            strategy_epoch: 0,
            max_supply: 0,
            paused: false,
        };
        log::info!(
            "Created vault {} on pool {} (fee {}, spacing {})",
            vault.address,
            vault.pool,
            vault.fee,
            vault.tick_spacing
        );

        let capability = StrategyCapability::new(vault.address, strategy, 0);
        Ok((vault, capability))
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token0(&self) -> Address {
        self.token0
    }

    pub fn token1(&self) -> Address {
        self.token1
    }

    pub fn active_pool(&self) -> Address {
        self.pool
    }

    pub fn active_fee(&self) -> u32 {
        self.fee
    }

    pub fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    pub fn main_position(&self) -> TickRange {
        self.main
    }

    pub fn range_position(&self) -> TickRange {
        self.range
    }

    pub fn performance_fee(&self) -> u32 {
        self.performance_fee
    }

    pub fn strategy(&self) -> Address {
        self.strategy
    }

    pub fn max_supply(&self) -> u128 {
        self.max_supply
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn shares(&self) -> &ShareLedger {
        &self.shares
    }

    // ------------------------------------------------------------------------
    // Share token
    // ------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        self.shares.name()
    }

    pub fn symbol(&self) -> &str {
        self.shares.symbol()
    }

    pub fn total_supply(&self) -> u128 {
        self.shares.total_supply()
    }

    pub fn balance_of(&self, account: Address) -> u128 {
        self.shares.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.shares.allowance(owner, spender)
    }

    pub fn approve(&mut self, owner: Address, spender: Address, shares: u128) {
        self.shares.approve(owner, spender, shares);
    }

    pub fn transfer(&mut self, from: Address, to: Address, shares: u128) -> CoreResult<()> {
        self.shares.transfer(from, to, shares)
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        to: Address,
        shares: u128,
    ) -> CoreResult<()> {
        self.shares.transfer_from(spender, owner, to, shares)
    }

    // ------------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------------

    /// Hand rebalance authority to `new_strategy`. Every capability issued
    /// before this call stops working.
    pub fn set_strategy<R: Registry + ?Sized>(
        &mut self,
        registry: &R,
        caller: Address,
        new_strategy: Address,
    ) -> CoreResult<StrategyCapability> {
        registry.require_role(Role::Strategist, caller)?;
        registry.require_role(Role::Strategy, new_strategy)?;

        self.strategy_epoch += 1;
        self.strategy = new_strategy;
        log::info!(
            "Vault {} strategy set to {} (epoch {})",
            self.address,
            new_strategy,
            self.strategy_epoch
        );
        Ok(StrategyCapability::new(self.address, new_strategy, self.strategy_epoch))
    }

    pub fn set_performance_fee<R: Registry + ?Sized>(
        &mut self,
        registry: &R,
        caller: Address,
        performance_fee: u32,
    ) -> CoreResult<()> {
        registry.require_role(Role::Strategist, caller)?;
        if performance_fee > MAX_PERFORMANCE_FEE {
            return Err(VaultError::configuration(format!(
                "performance fee {} exceeds maximum {}",
                performance_fee, MAX_PERFORMANCE_FEE
            )));
        }
        self.performance_fee = performance_fee;
        log::info!("Vault {} performance fee set to {}", self.address, performance_fee);
        Ok(())
    }

    pub fn set_max_supply<R: Registry + ?Sized>(
        &mut self,
        registry: &R,
        caller: Address,
        max_supply: u128,
    ) -> CoreResult<()> {
        registry.require_role(Role::Strategist, caller)?;
        self.max_supply = max_supply;
        Ok(())
    }

    pub fn pause<R: Registry + ?Sized>(&mut self, registry: &R, caller: Address) -> CoreResult<()> {
        registry.require_role(Role::Pauser, caller)?;
        if self.paused {
            return Err(VaultError::Paused);
        }
        self.paused = true;
        log::warn!("Vault {} paused", self.address);
        Ok(())
    }

    pub fn unpause<R: Registry + ?Sized>(
        &mut self,
        registry: &R,
        caller: Address,
    ) -> CoreResult<()> {
        registry.require_role(Role::Pauser, caller)?;
        if !self.paused {
            return Err(VaultError::NotPaused);
        }
        self.paused = false;
        log::info!("Vault {} unpaused", self.address);
        Ok(())
    }

    /// Fail unless `capability` was issued by this vault to its current strategy
    pub fn check_capability(&self, capability: &StrategyCapability) -> CoreResult<()> {
        if capability.vault != self.address {
            return Err(VaultError::unauthorized("capability issued by another vault"));
        }
        if capability.strategy != self.strategy || capability.epoch != self.strategy_epoch {
            return Err(VaultError::unauthorized(format!(
                "strategy {} no longer manages vault {}",
                capability.strategy, self.address
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------------

    fn check_pool<P: Pool + ?Sized>(&self, pool: &P) -> CoreResult<()> {
        if pool.address() != self.pool {
            return Err(VaultError::configuration(format!(
                "vault {} is bound to pool {}, not {}",
                self.address,
                self.pool,
                pool.address()
            )));
        }
        Ok(())
    }

    fn check_active(&self) -> CoreResult<()> {
        if self.paused {
            return Err(VaultError::Paused);
        }
        Ok(())
    }

    /// Run `op` so that a failure leaves both the vault and the pool untouched
    fn transact<P, T>(
        &mut self,
        pool: &mut P,
        op: impl FnOnce(&mut Self, &mut P) -> CoreResult<T>,
    ) -> CoreResult<T>
    where
        P: Pool,
    {
        let saved = self.clone();
        atomically(pool, |pool| op(self, pool)).map_err(|err| {
            *self = saved;
            err
        })
    }
}

/// Fail with `DeadlineExpired` once `now` is past `deadline`
pub(crate) fn check_deadline(now: u64, deadline: u64) -> CoreResult<()> {
    if now > deadline {
        return Err(VaultError::DeadlineExpired { deadline, now });
    }
    Ok(())
}
