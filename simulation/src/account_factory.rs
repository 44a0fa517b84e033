use alloy_primitives::{keccak256, Address};

use crate::market::SimulatedPool;
use lixir_core::Pool;

/// Deterministic account addresses derived from labels
#[derive(Debug, Clone, Default)]
pub struct AccountFactory {
    created: usize,
}

impl AccountFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address derived from `label`; the same label always yields the same address
    pub fn address(label: &str) -> Address {
        Address::from_slice(&keccak256(label.as_bytes()).as_slice()[12..])
    }

    /// Create a fresh account named after a running counter
    pub fn create_account(&mut self, prefix: &str) -> Address {
        self.created += 1;
        Self::address(&format!("{}-{}", prefix, self.created))
    }

    /// Create `count` accounts holding `balance` of both pool tokens
    pub fn create_funded_accounts(
        &mut self,
        pool: &mut SimulatedPool,
        prefix: &str,
        count: usize,
        balance: u128,
    ) -> Vec<Address> {
        let (token0, token1) = (pool.token0(), pool.token1());
        (0..count)
            .map(|_| {
                let account = self.create_account(prefix);
                pool.deal(token0, account, balance);
                pool.deal(token1, account, balance);
                account
            })
            .collect()
    }
}

/// Role holders of a test deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestAccounts {
    pub gov: Address,
    pub delegate: Address,
    pub strategist: Address,
    pub keeper: Address,
    pub pauser: Address,
    pub fee_to: Address,
    /// Provides the pool's background liquidity
    pub market_maker: Address,
    pub trader: Address,
    pub users: Vec<Address>,
}

impl TestAccounts {
    pub fn new(factory: &mut AccountFactory, user_count: usize) -> Self {
        Self {
            gov: AccountFactory::address("gov"),
            delegate: AccountFactory::address("delegate"),
            strategist: AccountFactory::address("strategist"),
            keeper: AccountFactory::address("keeper"),
            pauser: AccountFactory::address("pauser"),
            fee_to: AccountFactory::address("fee-to"),
            market_maker: AccountFactory::address("market-maker"),
            trader: AccountFactory::address("trader"),
            users: (0..user_count).map(|_| factory.create_account("user")).collect(),
        }
    }
}
