//! # Simulated Market
//!
//! In-memory concentrated-liquidity pool implementing the vault's pool traits.
//! It keeps token balances for every account, positions keyed exactly as the
//! pool contract keys them, a tick-cumulative oracle and a settable clock.
//!
//! Not a general AMM: there is no tick bitmap and no protocol fee. Swaps are
//! priced by searching for the sqrt price whose input requirement matches the
//! trade (see [`crate::swap_simulator`]).

use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use lixir_core::math::{
    get_amounts_for_liquidity, sqrt_ratio_at_tick, sqrt_ratios_for_range, tick_at_sqrt_ratio,
    Rounding,
};
use lixir_core::{
    position_key, Clock, CoreResult, NativeCurrency, Pool, PositionInfo, Slot0, TickRange,
    TokenCustody, VaultError,
};

use crate::oracle::TickObservations;

/// Parameters of a new simulated pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    /// Hundredths of a bip
    pub fee: u32,
    pub tick_spacing: i32,
    pub initial_tick: i32,
    /// Unix timestamp the clock starts at
    pub start_time: u64,
    /// Token that native currency wraps into
    pub wrapped_native: Address,
}

/// Liquidity position held in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPosition {
    pub owner: Address,
    pub range: TickRange,
    pub liquidity: u128,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

#[derive(Debug, Clone)]
pub struct SimulatedPool {
    pub(crate) address: Address,
    pub(crate) token0: Address,
    pub(crate) token1: Address,
    pub(crate) fee: u32,
    pub(crate) tick_spacing: i32,
    pub(crate) sqrt_price_x96: U256,
    pub(crate) tick: i32,
    pub(crate) positions: HashMap<B256, PoolPosition>,
    balances: HashMap<(Address, Address), u128>,
    allowances: HashMap<(Address, Address, Address), u128>,
    native_balances: HashMap<Address, u128>,
    wrapped_native: Address,
    pub(crate) timestamp: u64,
    pub(crate) observations: TickObservations,
}

impl SimulatedPool {
    pub fn new(config: PoolConfig) -> CoreResult<Self> {
        if config.tick_spacing <= 0 {
            return Err(VaultError::configuration("tick spacing must be positive"));
        }
        if config.token0 == config.token1 {
            return Err(VaultError::configuration("pool tokens must differ"));
        }
        let sqrt_price_x96 = sqrt_ratio_at_tick(config.initial_tick)?;

        Ok(Self {
            address: config.address,
            token0: config.token0,
            token1: config.token1,
            fee: config.fee,
            tick_spacing: config.tick_spacing,
            sqrt_price_x96,
            tick: config.initial_tick,
            positions: HashMap::new(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            native_balances: HashMap::new(),
            wrapped_native: config.wrapped_native,
            timestamp: config.start_time,
            observations: TickObservations::new(config.start_time),
        })
    }

    /// Credit `amount` of `token` to `account` out of thin air
    pub fn deal(&mut self, token: Address, account: Address, amount: u128) {
        let balance = self.balances.entry((token, account)).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Credit native currency to `account`
    pub fn deal_native(&mut self, account: Address, amount: u128) {
        let balance = self.native_balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.timestamp += seconds;
    }

    pub fn set_time(&mut self, timestamp: u64) -> CoreResult<()> {
        if timestamp < self.timestamp {
            return Err(VaultError::configuration("time cannot move backwards"));
        }
        self.timestamp = timestamp;
        Ok(())
    }

    /// Move the price directly to `tick`, recording the old tick in the oracle
    pub fn set_tick(&mut self, tick: i32) -> CoreResult<()> {
        let sqrt_price_x96 = sqrt_ratio_at_tick(tick)?;
        self.set_price(sqrt_price_x96)
    }

    pub(crate) fn set_price(&mut self, sqrt_price_x96: U256) -> CoreResult<()> {
        let tick = tick_at_sqrt_ratio(sqrt_price_x96)?;
        self.observations.write(self.timestamp, self.tick)?;
        self.sqrt_price_x96 = sqrt_price_x96;
        self.tick = tick;
        Ok(())
    }

    pub fn positions(&self) -> impl Iterator<Item = &PoolPosition> {
        self.positions.values()
    }

    /// Liquidity of positions whose range contains the current price
    pub fn active_liquidity(&self) -> u128 {
        self.positions
            .values()
            .filter(|position| position.range.contains(self.tick))
            .map(|position| position.liquidity)
            .sum()
    }

    fn position_mut(&mut self, owner: Address, range: TickRange) -> CoreResult<&mut PoolPosition> {
        self.positions
            .get_mut(&position_key(owner, range.tick_lower, range.tick_upper))
            .ok_or(VaultError::PositionNotFound)
    }

    fn credit(&mut self, token: Address, account: Address, amount: u128) -> CoreResult<()> {
        let balance = self.balances.entry((token, account)).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    fn debit(&mut self, token: Address, account: Address, amount: u128) -> CoreResult<()> {
        let balance = self.balances.entry((token, account)).or_insert(0);
        *balance = balance.checked_sub(amount).ok_or(VaultError::InsufficientBalance)?;
        Ok(())
    }
}

impl TokenCustody for SimulatedPool {
    fn balance_of(&self, token: Address, account: Address) -> u128 {
        self.balances.get(&(token, account)).copied().unwrap_or(0)
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> u128 {
        self.allowances.get(&(token, owner, spender)).copied().unwrap_or(0)
    }

    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: u128) {
        self.allowances.insert((token, owner, spender), amount);
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> CoreResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.debit(token, from, amount)?;
        self.credit(token, to, amount)
    }

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> CoreResult<()> {
        let allowance = self.allowance(token, from, spender);
        if allowance != u128::MAX {
            let remaining = allowance.checked_sub(amount).ok_or(VaultError::AllowanceExceeded)?;
            self.allowances.insert((token, from, spender), remaining);
        }
        self.transfer(token, from, to, amount)
    }
}

impl Clock for SimulatedPool {
    fn now(&self) -> u64 {
        self.timestamp
    }
}

impl NativeCurrency for SimulatedPool {
    fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    fn native_balance(&self, account: Address) -> u128 {
        self.native_balances.get(&account).copied().unwrap_or(0)
    }

    fn wrap_native(&mut self, account: Address, amount: u128) -> CoreResult<()> {
        let native = self.native_balances.entry(account).or_insert(0);
        *native = native.checked_sub(amount).ok_or(VaultError::InsufficientBalance)?;
        self.credit(self.wrapped_native, account, amount)
    }

    fn unwrap_native(&mut self, account: Address, amount: u128) -> CoreResult<()> {
        self.debit(self.wrapped_native, account, amount)?;
        let native = self.native_balances.entry(account).or_insert(0);
        *native = native.checked_add(amount).ok_or(VaultError::MathOverflow)?;
        Ok(())
    }
}

impl Pool for SimulatedPool {
    type Snapshot = SimulatedPool;

    fn address(&self) -> Address {
        self.address
    }

    fn token0(&self) -> Address {
        self.token0
    }

    fn token1(&self) -> Address {
        self.token1
    }

    fn fee(&self) -> u32 {
        self.fee
    }

    fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    fn slot0(&self) -> Slot0 {
        Slot0 {
            sqrt_price_x96: self.sqrt_price_x96,
            tick: self.tick,
        }
    }

    fn position(&self, key: B256) -> PositionInfo {
        self.positions
            .get(&key)
            .map(|position| PositionInfo {
                liquidity: position.liquidity,
                tokens_owed0: position.tokens_owed0,
                tokens_owed1: position.tokens_owed1,
            })
            .unwrap_or_default()
    }

    fn observe(&self, seconds_agos: &[u32]) -> CoreResult<Vec<i64>> {
        seconds_agos
            .iter()
            .map(|seconds_ago| self.observations.observe(self.timestamp, *seconds_ago, self.tick))
            .collect()
    }

    fn mint(
        &mut self,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> CoreResult<(u128, u128)> {
        range.validate(self.tick_spacing)?;
        if liquidity == 0 {
            return Err(VaultError::InvalidAmount);
        }

        let (sqrt_lower, sqrt_upper) = sqrt_ratios_for_range(&range)?;
        let (amount0, amount1) =
            get_amounts_for_liquidity(
                self.sqrt_price_x96,
                sqrt_lower,
                sqrt_upper,
                liquidity,
                Rounding::Up,
            )?;
        let (token0, token1, pool) = (self.token0, self.token1, self.address);
        self.transfer(token0, owner, pool, amount0)?;
        self.transfer(token1, owner, pool, amount1)?;

        let position = self
            .positions
            .entry(position_key(owner, range.tick_lower, range.tick_upper))
            .or_insert(PoolPosition {
                owner,
                range,
                liquidity: 0,
                tokens_owed0: 0,
                tokens_owed1: 0,
            });
        position.liquidity = position
            .liquidity
            .checked_add(liquidity)
            .ok_or(VaultError::MathOverflow)?;

        log::trace!(
            "Mint {} liquidity for {} in {}: ({}, {})",
            liquidity,
            owner,
            range,
            amount0,
            amount1
        );
        Ok((amount0, amount1))
    }

    fn burn(
        &mut self,
        owner: Address,
        range: TickRange,
        liquidity: u128,
    ) -> CoreResult<(u128, u128)> {
        let (sqrt_lower, sqrt_upper) = sqrt_ratios_for_range(&range)?;
        let sqrt_price_x96 = self.sqrt_price_x96;
        let position = self.position_mut(owner, range)?;
        if liquidity > position.liquidity {
            return Err(VaultError::InvalidAmount);
        }

        let (amount0, amount1) =
            get_amounts_for_liquidity(
                sqrt_price_x96,
                sqrt_lower,
                sqrt_upper,
                liquidity,
                Rounding::Down,
            )?;
        position.liquidity -= liquidity;
        position.tokens_owed0 = position
            .tokens_owed0
            .checked_add(amount0)
            .ok_or(VaultError::MathOverflow)?;
        position.tokens_owed1 = position
            .tokens_owed1
            .checked_add(amount1)
            .ok_or(VaultError::MathOverflow)?;

        log::trace!(
            "Burn {} liquidity for {} in {}: ({}, {})",
            liquidity,
            owner,
            range,
            amount0,
            amount1
        );
        Ok((amount0, amount1))
    }

    fn collect(
        &mut self,
        owner: Address,
        recipient: Address,
        range: TickRange,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> CoreResult<(u128, u128)> {
        let key = position_key(owner, range.tick_lower, range.tick_upper);
        let Some(position) = self.positions.get_mut(&key) else {
            return Ok((0, 0));
        };
        let amount0 = amount0_requested.min(position.tokens_owed0);
        let amount1 = amount1_requested.min(position.tokens_owed1);
        position.tokens_owed0 -= amount0;
        position.tokens_owed1 -= amount1;
        if position.liquidity == 0 && position.tokens_owed0 == 0 && position.tokens_owed1 == 0 {
            self.positions.remove(&key);
        }

        let (token0, token1, pool) = (self.token0, self.token1, self.address);
        self.transfer(token0, pool, recipient, amount0)?;
        self.transfer(token1, pool, recipient, amount1)?;
        Ok((amount0, amount1))
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        *self = snapshot;
    }
}
