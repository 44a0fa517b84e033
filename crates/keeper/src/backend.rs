//! Where the keeper reads vault state and sends rebalances.
//!
//! [`SimulatedBackend`] runs every configured vault on its own in-memory pool
//! with random order flow between keeper iterations.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use lixir_core::{Pool, PoolOracle, RebalanceReport, TickOracle, TickRange};
use lixir_simulation::{EnvironmentConfig, ScenarioConfig, ScenarioRunner, TestEnvironment};
use serde::Serialize;

use crate::config::KeeperConfig;
use crate::error::{KeeperError, KeeperResult};

/// Point-in-time view of a managed vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultStatus {
    pub name: String,
    pub vault: Address,
    /// Pool clock, unix seconds
    pub timestamp: u64,
    pub tick: i32,
    /// GWAP over the vault's window; `None` while the oracle cannot answer
    pub gwap_tick: Option<i32>,
    pub max_tick_diff: i32,
    pub main: TickRange,
    pub range: TickRange,
    pub main_liquidity: u128,
    pub range_liquidity: u128,
    pub total0: u128,
    pub total1: u128,
    pub total_supply: u128,
    pub paused: bool,
}

/// Source of vault state and sink for rebalances
pub trait VaultBackend {
    fn vault_names(&self) -> Vec<String>;

    fn status(&self, vault: &str) -> KeeperResult<VaultStatus>;

    /// Rebalance `vault` at the tick the backend currently observes
    fn rebalance(&mut self, vault: &str) -> KeeperResult<RebalanceReport>;

    fn health(&self) -> KeeperResult<()> {
        Ok(())
    }
}

/// Backend running each vault against a [`SimulatedPool`](lixir_simulation::SimulatedPool)
pub struct SimulatedBackend {
    markets: BTreeMap<String, ScenarioRunner>,
}

impl SimulatedBackend {
    /// Deploy every configured vault, enabled or not, and seed it with one
    /// deposit per simulated user
    pub fn new(config: &KeeperConfig) -> KeeperResult<Self> {
        let mut markets = BTreeMap::new();
        for (index, vault) in config.vaults.iter().enumerate() {
            let env = TestEnvironment::new(EnvironmentConfig {
                fee: vault.fee,
                tick_spacing: vault.tick_spacing,
                initial_tick: vault.initial_tick,
                performance_fee: vault.performance_fee,
                strategy: vault.strategy_params(),
                ..EnvironmentConfig::default()
            })?;
            let mut runner = ScenarioRunner::new(
                env,
                ScenarioConfig {
                    seed: config.market.seed.wrapping_add(index as u64),
                    max_swap: config.market.max_swap(),
                    max_deposit: config.market.max_initial_deposit(),
                    max_time_step: config.market.max_time_step,
                    rebalance_every: 0,
                },
            );
            runner.seed_deposits()?;
            log::info!(
                "Deployed simulated vault {} at {} (tick {})",
                vault.name,
                runner.env.vault.address(),
                runner.env.pool.slot0().tick
            );
            markets.insert(vault.name.clone(), runner);
        }
        Ok(Self { markets })
    }

    /// Trade `swaps` random swaps against every pool, letting time pass between them
    pub fn advance_market(&mut self, swaps: usize) -> KeeperResult<()> {
        for (name, runner) in self.markets.iter_mut() {
            runner.generate_flow(swaps)?;
            log::debug!("Market {} now at tick {}", name, runner.env.pool.slot0().tick);
        }
        Ok(())
    }

    pub fn environment(&self, vault: &str) -> KeeperResult<&TestEnvironment> {
        self.markets
            .get(vault)
            .map(|runner| &runner.env)
            .ok_or_else(|| KeeperError::UnknownVault(vault.to_string()))
    }

    pub fn environment_mut(&mut self, vault: &str) -> KeeperResult<&mut TestEnvironment> {
        self.markets
            .get_mut(vault)
            .map(|runner| &mut runner.env)
            .ok_or_else(|| KeeperError::UnknownVault(vault.to_string()))
    }
}

impl VaultBackend for SimulatedBackend {
    fn vault_names(&self) -> Vec<String> {
        self.markets.keys().cloned().collect()
    }

    fn status(&self, vault: &str) -> KeeperResult<VaultStatus> {
        let env = self.environment(vault)?;
        let address = env.vault.address();
        let data = env
            .strategy
            .vault_datas(address)
            .ok_or(KeeperError::Vault(lixir_core::VaultError::NotConfigured))?;
        let gwap_tick = PoolOracle::new(&env.pool)
            .observe_mean_tick(data.tick_short_duration)
            .ok();
        let totals = env.vault.calculate_totals(&env.pool)?;

        Ok(VaultStatus {
            name: vault.to_string(),
            vault: address,
            timestamp: env.now(),
            tick: env.pool.slot0().tick,
            gwap_tick,
            max_tick_diff: data.max_tick_diff,
            main: env.vault.main_position(),
            range: env.vault.range_position(),
            main_liquidity: totals.main_liquidity,
            range_liquidity: totals.range_liquidity,
            total0: totals.total0,
            total1: totals.total1,
            total_supply: env.vault.total_supply(),
            paused: env.vault.paused(),
        })
    }

    fn rebalance(&mut self, vault: &str) -> KeeperResult<RebalanceReport> {
        let report = self.environment_mut(vault)?.rebalance()?;
        Ok(report)
    }
}
