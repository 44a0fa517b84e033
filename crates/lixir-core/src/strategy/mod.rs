//! # GWAP Strategy
//!
//! Rebalances vaults around the pool's time-weighted average tick. Each vault the
//! strategy manages carries its own [`VaultData`]: GWAP window, manipulation
//! guard, spreads and the oracle checkpoint of the last rebalance.
//!
//! A rebalance:
//! 1. reads the GWAP over the vault's short window,
//! 2. rejects the call if the keeper-observed tick strays more than
//!    `max_tick_diff` from it,
//! 3. centres the main position on the GWAP and offers bid and ask candidates
//!    for the range position,
//! 4. hands the plan to the vault, which pulls, charges fees and redeploys.

use std::collections::HashMap;

use alloy_primitives::Address;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAIN_SPREAD, DEFAULT_MAX_TICK_DIFF, DEFAULT_RANGE_SPREAD, DEFAULT_TICK_SHORT_DURATION,
    MAX_TICK_PARAMETER,
};
use crate::errors::{CoreResult, VaultError};
use crate::math::{get_ask_ticks, get_bid_ticks, get_main_ticks};
use crate::oracle::{OracleCheckpoint, PoolOracle, TickOracle};
use crate::pool::Pool;
use crate::registry::{Registry, Role};
use crate::types::RebalanceReport;
use crate::vault::{RepositionPlan, StrategyCapability, Vault};

/// Per-vault configuration and oracle checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct VaultData {
    /// GWAP window in seconds
    pub tick_short_duration: u32,
    /// Largest tolerated distance between the GWAP and the observed tick
    pub max_tick_diff: i32,
    pub main_spread: i32,
    pub range_spread: i32,
    /// Tick cumulative at the last configuration or rebalance
    pub tick_cumulative: i64,
    pub timestamp: u64,
}

/// Inputs of [`GwapStrategy::configure_vault`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct StrategyParams {
    /// Pool fee tier; must match the vault's active fee
    pub fee: u32,
    pub tick_short_duration: u32,
    pub max_tick_diff: i32,
    pub main_spread: i32,
    pub range_spread: i32,
}

impl StrategyParams {
    /// Default parameters for a pool with fee tier `fee`
    pub fn for_fee(fee: u32) -> Self {
        Self {
            fee,
            tick_short_duration: DEFAULT_TICK_SHORT_DURATION,
            max_tick_diff: DEFAULT_MAX_TICK_DIFF,
            main_spread: DEFAULT_MAIN_SPREAD,
            range_spread: DEFAULT_RANGE_SPREAD,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_short_duration == 0 {
            return Err(VaultError::configuration("tick short duration must be positive"));
        }
        validate_tick_parameter("max tick diff", self.max_tick_diff, 0)?;
        validate_tick_parameter("main spread", self.main_spread, 1)?;
        validate_tick_parameter("range spread", self.range_spread, 1)?;
        Ok(())
    }
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self::for_fee(3000)
    }
}

fn validate_tick_parameter(name: &str, value: i32, min: i32) -> CoreResult<()> {
    if !(min..=MAX_TICK_PARAMETER).contains(&value) {
        return Err(VaultError::configuration(format!(
            "{} {} outside [{}, {}]",
            name, value, min, MAX_TICK_PARAMETER
        )));
    }
    Ok(())
}

/// Fail with `ManipulationSuspected` if `observed_tick` is too far from `gwap_tick`
pub fn check_tick_divergence(
    gwap_tick: i32,
    observed_tick: i32,
    max_tick_diff: i32,
) -> CoreResult<()> {
    let diff = (i64::from(gwap_tick) - i64::from(observed_tick)).abs();
    if diff > i64::from(max_tick_diff) {
        return Err(VaultError::ManipulationSuspected {
            gwap_tick,
            observed_tick,
            max_tick_diff,
        });
    }
    Ok(())
}

/// Positions for a vault centred on `gwap_tick`
pub fn plan_positions(
    gwap_tick: i32,
    tick_spacing: i32,
    data: &VaultData,
) -> CoreResult<RepositionPlan> {
    Ok(RepositionPlan {
        gwap_tick,
        main: get_main_ticks(gwap_tick, tick_spacing, data.main_spread)?,
        bid: get_bid_ticks(gwap_tick, tick_spacing, data.range_spread)?,
        ask: get_ask_ticks(gwap_tick, tick_spacing, data.range_spread)?,
    })
}

#[derive(Debug, Clone)]
pub struct GwapStrategy {
    address: Address,
    vault_datas: HashMap<Address, VaultData>,
    capabilities: HashMap<Address, StrategyCapability>,
}

impl GwapStrategy {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            vault_datas: HashMap::new(),
            capabilities: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Snapshot of a vault's configuration and checkpoint
    pub fn vault_datas(&self, vault: Address) -> Option<VaultData> {
        self.vault_datas.get(&vault).copied()
    }

    /// Start managing `vault` with `params`.
    ///
    /// A vault that holds no liquidity gets its main position centred on the
    /// current pool tick and its range position cleared.
    pub fn configure_vault<P, R>(
        &mut self,
        vault: &mut Vault,
        pool: &P,
        registry: &R,
        caller: Address,
        capability: StrategyCapability,
        params: StrategyParams,
    ) -> CoreResult<()>
    where
        P: Pool + ?Sized,
        R: Registry + ?Sized,
    {
        registry.require_role(Role::Strategist, caller)?;
        if capability.strategy() != self.address {
            return Err(VaultError::unauthorized("capability belongs to another strategy"));
        }
        vault.check_capability(&capability)?;
        if params.fee != vault.active_fee() {
            return Err(VaultError::configuration(format!(
                "fee {} does not match the vault's active fee {}",
                params.fee,
                vault.active_fee()
            )));
        }
        params.validate()?;

        let main = get_main_ticks(pool.slot0().tick, vault.tick_spacing(), params.main_spread)?;
        vault.initialize_positions(pool, &capability, main)?;

        let checkpoint = PoolOracle::new(pool).latest_cumulative()?;
        let data = VaultData {
            tick_short_duration: params.tick_short_duration,
            max_tick_diff: params.max_tick_diff,
            main_spread: params.main_spread,
            range_spread: params.range_spread,
            tick_cumulative: checkpoint.tick_cumulative,
            timestamp: checkpoint.timestamp,
        };
        self.vault_datas.insert(vault.address(), data);
        self.capabilities.insert(vault.address(), capability);
        log::info!(
            "Configured vault {}: window {}s, max tick diff {}, spreads {}/{}",
            vault.address(),
            data.tick_short_duration,
            data.max_tick_diff,
            data.main_spread,
            data.range_spread
        );
        Ok(())
    }

    pub fn set_max_tick_diff<R: Registry + ?Sized>(
        &mut self,
        registry: &R,
        caller: Address,
        vault: Address,
        max_tick_diff: i32,
    ) -> CoreResult<()> {
        registry.require_role(Role::Strategist, caller)?;
        validate_tick_parameter("max tick diff", max_tick_diff, 0)?;
        let data = self
            .vault_datas
            .get_mut(&vault)
            .ok_or(VaultError::NotConfigured)?;
        data.max_tick_diff = max_tick_diff;
        Ok(())
    }

    /// Rebalance `vault` using the pool's own tick cumulatives as the oracle
    pub fn rebalance<P, R>(
        &mut self,
        vault: &mut Vault,
        pool: &mut P,
        registry: &R,
        caller: Address,
        observed_tick: i32,
    ) -> CoreResult<RebalanceReport>
    where
        P: Pool,
        R: Registry + ?Sized,
    {
        let (data, capability) = self.authorize(vault, registry, caller)?;
        let oracle = PoolOracle::new(&*pool);
        let gwap_tick = oracle.observe_mean_tick(data.tick_short_duration)?;
        let checkpoint = oracle.latest_cumulative()?;
        self.execute(vault, pool, registry, data, capability, observed_tick, gwap_tick, checkpoint)
    }

    /// Rebalance `vault` reading the GWAP from `oracle`
    pub fn rebalance_with_oracle<P, R>(
        &mut self,
        vault: &mut Vault,
        pool: &mut P,
        registry: &R,
        caller: Address,
        observed_tick: i32,
        oracle: &dyn TickOracle,
    ) -> CoreResult<RebalanceReport>
    where
        P: Pool,
        R: Registry + ?Sized,
    {
        let (data, capability) = self.authorize(vault, registry, caller)?;
        let gwap_tick = oracle.observe_mean_tick(data.tick_short_duration)?;
        let checkpoint = oracle.latest_cumulative()?;
        self.execute(vault, pool, registry, data, capability, observed_tick, gwap_tick, checkpoint)
    }

    fn authorize<R: Registry + ?Sized>(
        &self,
        vault: &Vault,
        registry: &R,
        caller: Address,
    ) -> CoreResult<(VaultData, StrategyCapability)> {
        registry.require_role(Role::Keeper, caller)?;
        let data = self
            .vault_datas(vault.address())
            .ok_or(VaultError::NotConfigured)?;
        let capability = self
            .capabilities
            .get(&vault.address())
            .copied()
            .ok_or(VaultError::NotConfigured)?;
        vault.check_capability(&capability)?;
        Ok((data, capability))
    }

    #[allow(clippy::too_many_arguments)]
    fn execute<P, R>(
        &mut self,
        vault: &mut Vault,
        pool: &mut P,
        registry: &R,
        data: VaultData,
        capability: StrategyCapability,
        observed_tick: i32,
        gwap_tick: i32,
        checkpoint: OracleCheckpoint,
    ) -> CoreResult<RebalanceReport>
    where
        P: Pool,
        R: Registry + ?Sized,
    {
        if let Err(err) = check_tick_divergence(gwap_tick, observed_tick, data.max_tick_diff) {
            log::warn!("Rejected rebalance of vault {}: {}", vault.address(), err);
            return Err(err);
        }

        let plan = plan_positions(gwap_tick, vault.tick_spacing(), &data)?;
        let report = vault.rebalance(pool, registry, &capability, plan)?;

        if let Some(stored) = self.vault_datas.get_mut(&vault.address()) {
            stored.tick_cumulative = checkpoint.tick_cumulative;
            stored.timestamp = checkpoint.timestamp;
        }
        log::debug!(
            "Vault {} checkpoint at {} (cumulative {})",
            vault.address(),
            checkpoint.timestamp,
            checkpoint.tick_cumulative
        );
        Ok(report)
    }
}
