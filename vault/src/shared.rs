//! # Shared Vault Handle
//!
//! [`Vault`] methods take `&mut self`, so a single-threaded host that
//! already serializes calls needs no locking at all. A concurrent host
//! wraps the vault in a [`SharedVault`]: a clonable handle whose every
//! operation holds one `parking_lot::Mutex` across the full
//! read-modify-write, so the "check count, execute, reset" sequence of
//! a confirmation can never interleave with another caller's mutation
//! and a round can never double-execute or drop a confirmation to a
//! race.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::asset::FungibleAsset;
use crate::identity::Address;
use crate::registry::Role;
use crate::vault::{RoundPhase, Vault, VaultError};

/// A clonable, thread-safe handle to a [`Vault`].
///
/// Each method acquires the lock, runs the underlying operation to
/// completion, and releases it. No lock is held across anything the
/// caller does between operations.
#[derive(Clone)]
pub struct SharedVault {
    inner: Arc<Mutex<Vault>>,
}

impl SharedVault {
    /// Wraps a vault for shared access.
    pub fn new(vault: Vault) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vault)),
        }
    }

    /// See [`Vault::grant_role`].
    pub fn grant_role(&self, caller: &Address, who: Address, role: Role) -> Result<(), VaultError> {
        self.inner.lock().grant_role(caller, who, role)
    }

    /// See [`Vault::revoke_role`].
    pub fn revoke_role(
        &self,
        caller: &Address,
        who: &Address,
        role: Role,
    ) -> Result<(), VaultError> {
        self.inner.lock().revoke_role(caller, who, role)
    }

    /// See [`Vault::bind_asset`].
    pub fn bind_asset(
        &self,
        caller: &Address,
        asset: Box<dyn FungibleAsset>,
    ) -> Result<(), VaultError> {
        self.inner.lock().bind_asset(caller, asset)
    }

    /// See [`Vault::balance`].
    pub fn balance(&self) -> Result<u64, VaultError> {
        self.inner.lock().balance()
    }

    /// See [`Vault::confirm_emergency_withdraw`]. The whole
    /// insert-execute-reset unit runs under one lock acquisition.
    pub fn confirm_emergency_withdraw(&self, caller: Address) -> Result<(), VaultError> {
        self.inner.lock().confirm_emergency_withdraw(caller)
    }

    /// See [`Vault::has_role`].
    pub fn has_role(&self, who: &Address, role: Role) -> bool {
        self.inner.lock().has_role(who, role)
    }

    /// See [`Vault::phase`].
    pub fn phase(&self) -> RoundPhase {
        self.inner.lock().phase()
    }

    /// See [`Vault::confirmation_count`].
    pub fn confirmation_count(&self) -> usize {
        self.inner.lock().confirmation_count()
    }

    /// Runs `f` with the locked vault, for inspection that spans more
    /// than one accessor without the state shifting in between.
    pub fn with<R>(&self, f: impl FnOnce(&Vault) -> R) -> R {
        f(&self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::TokenLedger;
    use crate::vault::VaultConfig;
    use std::thread;

    fn addr(tag: u8) -> Address {
        Address::from_bytes([tag; 32])
    }

    fn shared_vault(threshold: u32, funds: u64) -> SharedVault {
        let deployer = addr(1);
        let vault = Vault::new(
            deployer,
            VaultConfig {
                vault_address: addr(10),
                recipient: addr(11),
                threshold,
            },
        )
        .unwrap();
        let shared = SharedVault::new(vault);

        let mut ledger = TokenLedger::new("Mock Token", "MK");
        ledger.mint(addr(10), funds).unwrap();
        shared.bind_asset(&deployer, Box::new(ledger)).unwrap();
        shared
    }

    #[test]
    fn handle_clones_share_state() {
        let shared = shared_vault(2, 100);
        let other = shared.clone();

        shared.grant_role(&addr(1), addr(2), Role::Signer).unwrap();
        assert!(other.has_role(&addr(2), Role::Signer));
    }

    #[test]
    fn concurrent_confirmations_execute_exactly_once() {
        let shared = shared_vault(2, 5_000);
        for tag in 2..=3 {
            shared.grant_role(&addr(1), addr(tag), Role::Signer).unwrap();
        }

        let handles: Vec<_> = (2..=3)
            .map(|tag| {
                let shared = shared.clone();
                thread::spawn(move || shared.confirm_emergency_withdraw(addr(tag)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        // Both confirmations landed; the round executed once and reset.
        assert_eq!(shared.balance().unwrap(), 0);
        assert_eq!(shared.confirmation_count(), 0);
        assert_eq!(shared.phase(), RoundPhase::Idle);
    }

    #[test]
    fn with_gives_consistent_view() {
        let shared = shared_vault(3, 100);
        shared.grant_role(&addr(1), addr(2), Role::Signer).unwrap();
        shared.confirm_emergency_withdraw(addr(2)).unwrap();

        let (count, phase) = shared.with(|v| (v.confirmation_count(), v.phase()));
        assert_eq!(count, 1);
        assert_eq!(phase, RoundPhase::Collecting);
    }
}
