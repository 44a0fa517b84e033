//! # Registry
//!
//! Role membership and the performance-fee recipient. Vaults and strategies only
//! read through [`Registry`]; [`RoleRegistry`] is an in-memory implementation
//! with governance-controlled role management.

use std::collections::{HashMap, HashSet};

use alloy_primitives::Address;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

use crate::errors::{CoreResult, VaultError};

/// Permission held by an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum Role {
    Gov,
    Delegate,
    Strategist,
    Keeper,
    Pauser,
    FeeSetter,
    Deployer,
    /// Held by strategy contracts allowed to manage vaults
    Strategy,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Gov,
        Role::Delegate,
        Role::Strategist,
        Role::Keeper,
        Role::Pauser,
        Role::FeeSetter,
        Role::Deployer,
        Role::Strategy,
    ];
}

/// Read access to roles and the fee recipient
pub trait Registry {
    fn has_role(&self, role: Role, account: Address) -> bool;

    /// Recipient of performance-fee shares, if any
    fn fee_to(&self) -> Option<Address>;

    fn is_gov_or_delegate(&self, account: Address) -> bool {
        self.has_role(Role::Gov, account) || self.has_role(Role::Delegate, account)
    }

    /// Fail with `MissingRole` unless `account` holds `role`
    fn require_role(&self, role: Role, account: Address) -> CoreResult<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(VaultError::MissingRole { role })
        }
    }
}

/// In-memory role table
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    members: HashMap<Role, HashSet<Address>>,
    fee_to: Option<Address>,
}

impl RoleRegistry {
    /// Registry whose only member is `gov`
    pub fn new(gov: Address) -> Self {
        let mut registry = Self::default();
        registry.members.entry(Role::Gov).or_default().insert(gov);
        registry
    }

    /// Grant `role` to `account`. Gov may grant any role; a delegate may grant
    /// anything but `Gov` and `Delegate`.
    pub fn grant_role(&mut self, caller: Address, role: Role, account: Address) -> CoreResult<()> {
        self.check_admin(caller, role)?;
        if self.members.entry(role).or_default().insert(account) {
            log::info!("Granted {:?} to {}", role, account);
        }
        Ok(())
    }

    pub fn revoke_role(&mut self, caller: Address, role: Role, account: Address) -> CoreResult<()> {
        self.check_admin(caller, role)?;
        let removed = self
            .members
            .get_mut(&role)
            .map(|members| members.remove(&account))
            .unwrap_or(false);
        if removed {
            log::info!("Revoked {:?} from {}", role, account);
        }
        Ok(())
    }

    pub fn set_fee_to(&mut self, caller: Address, fee_to: Option<Address>) -> CoreResult<()> {
        if !self.is_gov_or_delegate(caller) {
            return Err(VaultError::unauthorized("fee recipient is set by gov or delegate"));
        }
        self.fee_to = fee_to;
        Ok(())
    }

    /// Accounts holding `role`
    pub fn members(&self, role: Role) -> impl Iterator<Item = &Address> {
        self.members.get(&role).into_iter().flatten()
    }

    fn check_admin(&self, caller: Address, role: Role) -> CoreResult<()> {
        if self.has_role(Role::Gov, caller) {
            return Ok(());
        }
        match role {
            Role::Gov | Role::Delegate => Err(VaultError::MissingRole { role: Role::Gov }),
            _ if self.has_role(Role::Delegate, caller) => Ok(()),
            _ => Err(VaultError::unauthorized("roles are managed by gov or delegate")),
        }
    }
}

impl Registry for RoleRegistry {
    fn has_role(&self, role: Role, account: Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|members| members.contains(&account))
    }

    fn fee_to(&self) -> Option<Address> {
        self.fee_to
    }
}
