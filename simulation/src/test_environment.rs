use alloy_primitives::{Address, U256};
use lixir_core::math::value_in_token1;
use lixir_core::{
    CoreResult, DepositParams, DepositReceipt, GwapStrategy, Pool, RebalanceReport, Role,
    RoleRegistry, StrategyParams, TickRange, TokenCustody, Vault, VaultParams, WithdrawParams,
    WithdrawReceipt, MAX_TICK,
};

use crate::account_factory::{AccountFactory, TestAccounts};
use crate::market::{PoolConfig, SimulatedPool};
use crate::swap_simulator::SwapExecution;
use crate::{SimulationError, SimulationResult};

/// Settings of a test deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub fee: u32,
    pub tick_spacing: i32,
    pub initial_tick: i32,
    pub performance_fee: u32,
    pub strategy: StrategyParams,
    /// Pair the vault with the wrapped native token as token1
    pub native: bool,
    /// Full-range liquidity provided by the market maker
    pub background_liquidity: u128,
    pub user_count: usize,
    /// Balance of each token (and of native currency) given to every user
    pub user_balance: u128,
    pub start_time: u64,
    /// Seconds of oracle history before the vault is created
    pub warmup: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            fee: 3000,
            tick_spacing: 60,
            initial_tick: 0,
            performance_fee: 100_000,
            strategy: StrategyParams::for_fee(3000),
            native: false,
            background_liquidity: 10u128.pow(21),
            user_count: 5,
            user_balance: 10u128.pow(24),
            start_time: 1_600_000_000,
            warmup: 3_600,
        }
    }
}

/// Test environment with a pool, registry, strategy and one configured vault
pub struct TestEnvironment {
    pub config: EnvironmentConfig,
    pub accounts: TestAccounts,
    pub pool: SimulatedPool,
    pub registry: RoleRegistry,
    pub strategy: GwapStrategy,
    pub vault: Vault,
}

impl TestEnvironment {
    pub fn new(config: EnvironmentConfig) -> SimulationResult<Self> {
        if config.strategy.fee != config.fee {
            return Err(SimulationError::InvalidParameter(format!(
                "strategy fee {} differs from pool fee {}",
                config.strategy.fee, config.fee
            )));
        }

        let mut factory = AccountFactory::new();
        let accounts = TestAccounts::new(&mut factory, config.user_count);
        let strategy = GwapStrategy::new(AccountFactory::address("gwap-strategy"));

        let mut registry = RoleRegistry::new(accounts.gov);
        registry.grant_role(accounts.gov, Role::Delegate, accounts.delegate)?;
        registry.grant_role(accounts.gov, Role::Strategist, accounts.strategist)?;
        registry.grant_role(accounts.gov, Role::Keeper, accounts.keeper)?;
        registry.grant_role(accounts.gov, Role::Pauser, accounts.pauser)?;
        registry.grant_role(accounts.gov, Role::Strategy, strategy.address())?;
        registry.set_fee_to(accounts.gov, Some(accounts.fee_to))?;

        let wrapped_native = AccountFactory::address("wrapped-native");
        let mut pool = SimulatedPool::new(PoolConfig {
            address: AccountFactory::address("pool"),
            token0: AccountFactory::address("token0"),
            token1: if config.native {
                wrapped_native
            } else {
                AccountFactory::address("token1")
            },
            fee: config.fee,
            tick_spacing: config.tick_spacing,
            initial_tick: config.initial_tick,
            start_time: config.start_time,
            wrapped_native,
        })?;

        let (token0, token1) = (pool.token0(), pool.token1());
        let deep = 10u128.pow(30);
        for account in [accounts.market_maker, accounts.trader] {
            pool.deal(token0, account, deep);
            pool.deal(token1, account, deep);
        }
        for user in &accounts.users {
            pool.deal(token0, *user, config.user_balance);
            pool.deal(token1, *user, config.user_balance);
            if config.native {
                pool.deal_native(*user, config.user_balance);
            }
        }
        if config.background_liquidity > 0 {
            let bound = MAX_TICK / config.tick_spacing * config.tick_spacing;
            pool.mint(
                accounts.market_maker,
                TickRange::new(-bound, bound),
                config.background_liquidity,
            )?;
        }
        pool.advance_time(config.warmup);

        let (mut vault, capability) = Vault::new(
            VaultParams {
                address: AccountFactory::address("vault"),
                name: "Lixir Vault Token".to_string(),
                symbol: "LVT".to_string(),
                performance_fee: config.performance_fee,
            },
            &pool,
            &registry,
            strategy.address(),
        )?;
        let mut strategy = strategy;
        strategy.configure_vault(
            &mut vault,
            &pool,
            &registry,
            accounts.strategist,
            capability,
            config.strategy,
        )?;

        Ok(Self {
            config,
            accounts,
            pool,
            registry,
            strategy,
            vault,
        })
    }

    pub fn with_defaults() -> SimulationResult<Self> {
        Self::new(EnvironmentConfig::default())
    }

    pub fn now(&self) -> u64 {
        lixir_core::Clock::now(&self.pool)
    }

    pub fn user(&self, index: usize) -> Address {
        self.accounts.users[index]
    }

    pub fn deposit(
        &mut self,
        user: Address,
        amount0: u128,
        amount1: u128,
    ) -> CoreResult<DepositReceipt> {
        let params = DepositParams {
            amount0_desired: amount0,
            amount1_desired: amount1,
            amount0_min: 0,
            amount1_min: 0,
            recipient: user,
            deadline: self.now(),
        };
        self.vault.deposit(&mut self.pool, user, params)
    }

    pub fn withdraw(&mut self, user: Address, shares: u128) -> CoreResult<WithdrawReceipt> {
        let params = WithdrawParams {
            shares,
            amount0_min: 0,
            amount1_min: 0,
            recipient: user,
            deadline: self.now(),
        };
        self.vault.withdraw(&mut self.pool, user, params)
    }

    pub fn withdraw_all(&mut self, user: Address) -> CoreResult<WithdrawReceipt> {
        let shares = self.vault.balance_of(user);
        self.withdraw(user, shares)
    }

    /// Swap from the trader account
    pub fn swap(&mut self, zero_for_one: bool, amount_in: u128) -> CoreResult<SwapExecution> {
        let trader = self.accounts.trader;
        self.pool.swap_exact_input(trader, zero_for_one, amount_in)
    }

    /// Trade the price to approximately `tick`
    pub fn move_price_to(&mut self, tick: i32) -> CoreResult<Option<SwapExecution>> {
        let (zero_for_one, amount_in) = self.pool.quote_input_to_tick(tick)?;
        if amount_in == 0 {
            return Ok(None);
        }
        self.swap(zero_for_one, amount_in).map(Some)
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.pool.advance_time(seconds);
    }

    /// Let the current price fill the GWAP window so the GWAP equals the spot tick
    pub fn settle_gwap(&mut self) {
        let window = self.config.strategy.tick_short_duration;
        self.pool.advance_time(u64::from(window));
    }

    /// Rebalance as the keeper, reporting the current pool tick as observed
    pub fn rebalance(&mut self) -> CoreResult<RebalanceReport> {
        let observed_tick = self.pool.slot0().tick;
        self.rebalance_observing(observed_tick)
    }

    pub fn rebalance_observing(&mut self, observed_tick: i32) -> CoreResult<RebalanceReport> {
        let keeper = self.accounts.keeper;
        self.strategy
            .rebalance(&mut self.vault, &mut self.pool, &self.registry, keeper, observed_tick)
    }

    /// Vault holdings valued in token1 at the current price
    pub fn vault_value(&self) -> CoreResult<U256> {
        let totals = self.vault.calculate_totals(&self.pool)?;
        value_in_token1(self.pool.slot0().sqrt_price_x96, totals.total0, totals.total1)
    }

    /// Token balances of `account` valued in token1 at the current price
    pub fn account_value(&self, account: Address) -> CoreResult<U256> {
        let (token0, token1) = (self.pool.token0(), self.pool.token1());
        value_in_token1(
            self.pool.slot0().sqrt_price_x96,
            self.pool.balance_of(token0, account),
            self.pool.balance_of(token1, account),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_environment() {
        let env = TestEnvironment::with_defaults().unwrap();
        assert_eq!(env.vault.main_position(), TickRange::new(-1800, 1800));
        assert_eq!(env.vault.range_position(), TickRange::UNSET);
        assert_eq!(env.vault.total_supply(), 0);
        assert_eq!(env.pool.active_liquidity(), 10u128.pow(21));
        assert!(env.strategy.vault_datas(env.vault.address()).is_some());
    }

    #[test]
    fn test_mismatched_strategy_fee() {
        let config = EnvironmentConfig {
            strategy: StrategyParams::for_fee(500),
            ..EnvironmentConfig::default()
        };
        assert!(matches!(
            TestEnvironment::new(config),
            Err(SimulationError::InvalidParameter(_))
        ));
    }
}
