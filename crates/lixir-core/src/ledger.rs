//! # Share Ledger
//!
//! Fungible vault shares: balances, allowances and supply.

use std::collections::HashMap;

use alloy_primitives::Address;

use crate::errors::{CoreResult, VaultError};

/// ERC20-style share token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareLedger {
    name: String,
    symbol: String,
    total_supply: u128,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
}

impl ShareLedger {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, account: Address) -> u128 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    pub(crate) fn mint(&mut self, to: Address, shares: u128) -> CoreResult<()> {
        let supply = self
            .total_supply
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;
        let balance = self.balance_of(to) + shares;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        Ok(())
    }

    pub(crate) fn burn(&mut self, from: Address, shares: u128) -> CoreResult<()> {
        let balance = self
            .balance_of(from)
            .checked_sub(shares)
            .ok_or(VaultError::InsufficientShares)?;
        self.set_balance(from, balance);
        self.total_supply -= shares;
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, shares: u128) -> CoreResult<()> {
        let from_balance = self
            .balance_of(from)
            .checked_sub(shares)
            .ok_or(VaultError::InsufficientShares)?;
        self.set_balance(from, from_balance);
        let to_balance = self.balance_of(to) + shares;
        self.set_balance(to, to_balance);
        Ok(())
    }

    pub fn approve(&mut self, owner: Address, spender: Address, shares: u128) {
        if shares == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), shares);
        }
    }

    /// Move shares from `owner` using the allowance granted to `spender`
    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        to: Address,
        shares: u128,
    ) -> CoreResult<()> {
        if self.balance_of(owner) < shares {
            return Err(VaultError::InsufficientShares);
        }
        self.spend_allowance(owner, spender, shares)?;
        self.transfer(owner, to, shares)
    }

    /// Deduct `shares` from the allowance. `u128::MAX` is never decreased.
    pub(crate) fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        shares: u128,
    ) -> CoreResult<()> {
        let current = self.allowance(owner, spender);
        if current == u128::MAX {
            return Ok(());
        }
        let remaining = current
            .checked_sub(shares)
            .ok_or(VaultError::AllowanceExceeded)?;
        self.approve(owner, spender, remaining);
        Ok(())
    }

    fn set_balance(&mut self, account: Address, balance: u128) {
        if balance == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_mint_burn() {
        let mut ledger = ShareLedger::new("Lixir Vault Token", "LVT");
        ledger.mint(addr(1), 1_000).unwrap();
        ledger.mint(addr(2), 500).unwrap();
        assert_eq!(ledger.total_supply(), 1_500);

        ledger.burn(addr(1), 400).unwrap();
        assert_eq!(ledger.balance_of(addr(1)), 600);
        assert_eq!(ledger.total_supply(), 1_100);

        assert_eq!(ledger.burn(addr(2), 501), Err(VaultError::InsufficientShares));
        assert_eq!(ledger.total_supply(), 1_100);
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let mut ledger = ShareLedger::new("Lixir Vault Token", "LVT");
        ledger.mint(addr(1), 1_000).unwrap();
        ledger.approve(addr(1), addr(2), 300);

        ledger.transfer_from(addr(2), addr(1), addr(3), 200).unwrap();
        assert_eq!(ledger.allowance(addr(1), addr(2)), 100);
        assert_eq!(ledger.balance_of(addr(3)), 200);

        assert_eq!(
            ledger.transfer_from(addr(2), addr(1), addr(3), 101),
            Err(VaultError::AllowanceExceeded)
        );
        assert_eq!(ledger.balance_of(addr(1)), 800);
    }

    #[test]
    fn test_infinite_allowance() {
        let mut ledger = ShareLedger::new("Lixir Vault Token", "LVT");
        ledger.mint(addr(1), 1_000).unwrap();
        ledger.approve(addr(1), addr(2), u128::MAX);
        ledger.transfer_from(addr(2), addr(1), addr(2), 1_000).unwrap();
        assert_eq!(ledger.allowance(addr(1), addr(2)), u128::MAX);
    }

    proptest! {
        #[test]
        fn prop_supply_equals_sum_of_balances(
            ops in prop::collection::vec((0u8..4, 0u8..3, 0u8..3, 0u128..1_000), 1..50)
        ) {
            let mut ledger = ShareLedger::new("Lixir Vault Token", "LVT");
            for (kind, a, b, amount) in ops {
                let (a, b) = (addr(a), addr(b));
                let _ = match kind {
                    0 => ledger.mint(a, amount),
                    1 => ledger.burn(a, amount),
                    2 => ledger.transfer(a, b, amount),
                    _ => {
                        ledger.approve(a, b, amount);
                        ledger.transfer_from(b, a, b, amount / 2)
                    }
                };
            }
            let sum: u128 = (0..3).map(|i| ledger.balance_of(addr(i))).sum();
            prop_assert_eq!(sum, ledger.total_supply());
        }
    }
}
