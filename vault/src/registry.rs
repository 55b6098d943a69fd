//! # Role Registry
//!
//! Tracks which identities hold which capabilities. Two roles exist:
//!
//! - **Admin** — configures the vault: binds the custodied asset (once)
//!   and manages role membership.
//! - **Signer** — confirms the emergency-withdraw round.
//!
//! An identity may hold both roles, one, or neither. The registry is a
//! plain capability lookup consulted explicitly at the top of every
//! gated operation — no inheritance, no dynamic dispatch.
//!
//! ## Authorization Model
//!
//! Every mutation is Admin-gated: only a current Admin holder may grant
//! or revoke *either* role, including granting or revoking Admin itself.
//! The registry is seeded with the deployer as sole Admin and is never
//! destroyed while the vault exists.
//!
//! Grant and revoke are idempotent: granting a role the identity already
//! holds, or revoking one it does not hold, succeeds without changing
//! anything.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during role registry operations.
#[derive(Debug, Error)]
pub enum RoleError {
    /// The caller does not hold the role required for this operation.
    #[error("unauthorized: {caller} is missing role {required}")]
    Unauthorized {
        /// The address that attempted the operation.
        caller: Address,
        /// The role the operation requires.
        required: Role,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A capability an identity can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May manage role membership and bind the asset exactly once.
    Admin,
    /// May confirm the emergency-withdraw round.
    Signer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Signer => write!(f, "Signer"),
        }
    }
}

/// The capability map: identity → set of held roles.
///
/// Identities with an empty role set are pruned from the map, so the
/// serialized form never accumulates tombstones for fully-revoked
/// identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRegistry {
    roles: HashMap<Address, HashSet<Role>>,
}

impl RoleRegistry {
    /// Creates a registry with `deployer` as the sole Admin.
    pub fn new(deployer: Address) -> Self {
        let mut roles = HashMap::new();
        roles.insert(deployer, HashSet::from([Role::Admin]));
        tracing::info!(deployer = %deployer, "role registry initialized");
        Self { roles }
    }

    /// Returns `true` if `who` currently holds `role`.
    pub fn has_role(&self, who: &Address, role: Role) -> bool {
        self.roles.get(who).is_some_and(|set| set.contains(&role))
    }

    /// Fails with [`RoleError::Unauthorized`] unless `caller` holds Admin.
    ///
    /// Called at the top of every gated operation, both here and in the
    /// vault's binding path.
    pub fn require_admin(&self, caller: &Address) -> Result<(), RoleError> {
        if self.has_role(caller, Role::Admin) {
            Ok(())
        } else {
            Err(RoleError::Unauthorized {
                caller: *caller,
                required: Role::Admin,
            })
        }
    }

    /// Grants `role` to `who`.
    ///
    /// Idempotent: granting a role the identity already holds is a
    /// no-op success.
    ///
    /// # Errors
    ///
    /// Returns [`RoleError::Unauthorized`] if `caller` does not hold Admin.
    pub fn grant_role(&mut self, caller: &Address, who: Address, role: Role) -> Result<(), RoleError> {
        self.require_admin(caller)?;

        let inserted = self.roles.entry(who).or_default().insert(role);
        if inserted {
            tracing::info!(admin = %caller, who = %who, %role, "role granted");
        }
        Ok(())
    }

    /// Revokes `role` from `who`.
    ///
    /// Idempotent: revoking a role the identity does not hold is a
    /// no-op success.
    ///
    /// An Admin may revoke their own Admin role. If they are the last
    /// Admin, role management and asset binding are permanently frozen —
    /// the registry deliberately does not guard against this (governance
    /// that becomes immutable after setup is a valid deployment mode).
    ///
    /// # Errors
    ///
    /// Returns [`RoleError::Unauthorized`] if `caller` does not hold Admin.
    pub fn revoke_role(&mut self, caller: &Address, who: &Address, role: Role) -> Result<(), RoleError> {
        self.require_admin(caller)?;

        let removed = match self.roles.get_mut(who) {
            Some(set) => {
                let removed = set.remove(&role);
                if set.is_empty() {
                    self.roles.remove(who);
                }
                removed
            }
            None => false,
        };

        if removed {
            tracing::info!(admin = %caller, who = %who, %role, "role revoked");
            if role == Role::Admin && self.count_holders(Role::Admin) == 0 {
                tracing::warn!("last Admin revoked; role management is now frozen");
            }
        }
        Ok(())
    }

    /// Returns the number of identities currently holding `role`.
    pub fn count_holders(&self, role: Role) -> usize {
        self.roles.values().filter(|set| set.contains(&role)).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address::from_bytes([tag; 32])
    }

    #[test]
    fn deployer_is_sole_admin() {
        let deployer = addr(1);
        let registry = RoleRegistry::new(deployer);
        assert!(registry.has_role(&deployer, Role::Admin));
        assert!(!registry.has_role(&deployer, Role::Signer));
        assert_eq!(registry.count_holders(Role::Admin), 1);
    }

    #[test]
    fn admin_grants_signer() {
        let deployer = addr(1);
        let signer = addr(2);
        let mut registry = RoleRegistry::new(deployer);

        registry.grant_role(&deployer, signer, Role::Signer).unwrap();
        assert!(registry.has_role(&signer, Role::Signer));
    }

    #[test]
    fn non_admin_cannot_grant() {
        let deployer = addr(1);
        let outsider = addr(2);
        let target = addr(3);
        let mut registry = RoleRegistry::new(deployer);

        let result = registry.grant_role(&outsider, target, Role::Signer);
        assert!(matches!(result, Err(RoleError::Unauthorized { .. })));
        assert!(!registry.has_role(&target, Role::Signer));
    }

    #[test]
    fn non_admin_cannot_revoke() {
        let deployer = addr(1);
        let signer = addr(2);
        let outsider = addr(3);
        let mut registry = RoleRegistry::new(deployer);
        registry.grant_role(&deployer, signer, Role::Signer).unwrap();

        let result = registry.revoke_role(&outsider, &signer, Role::Signer);
        assert!(matches!(result, Err(RoleError::Unauthorized { .. })));
        assert!(registry.has_role(&signer, Role::Signer));
    }

    #[test]
    fn grant_is_idempotent() {
        let deployer = addr(1);
        let signer = addr(2);
        let mut registry = RoleRegistry::new(deployer);

        registry.grant_role(&deployer, signer, Role::Signer).unwrap();
        registry.grant_role(&deployer, signer, Role::Signer).unwrap();
        assert!(registry.has_role(&signer, Role::Signer));
        assert_eq!(registry.count_holders(Role::Signer), 1);
    }

    #[test]
    fn revoke_absent_role_is_idempotent() {
        let deployer = addr(1);
        let stranger = addr(2);
        let mut registry = RoleRegistry::new(deployer);

        registry.revoke_role(&deployer, &stranger, Role::Signer).unwrap();
        assert!(!registry.has_role(&stranger, Role::Signer));
    }

    #[test]
    fn admin_can_grant_admin() {
        let deployer = addr(1);
        let second = addr(2);
        let mut registry = RoleRegistry::new(deployer);

        registry.grant_role(&deployer, second, Role::Admin).unwrap();
        assert!(registry.has_role(&second, Role::Admin));
        assert_eq!(registry.count_holders(Role::Admin), 2);

        // The new Admin has full management rights.
        registry.grant_role(&second, addr(3), Role::Signer).unwrap();
    }

    #[test]
    fn identity_can_hold_both_roles() {
        let deployer = addr(1);
        let mut registry = RoleRegistry::new(deployer);

        registry.grant_role(&deployer, deployer, Role::Signer).unwrap();
        assert!(registry.has_role(&deployer, Role::Admin));
        assert!(registry.has_role(&deployer, Role::Signer));
    }

    #[test]
    fn last_admin_can_revoke_self() {
        let deployer = addr(1);
        let mut registry = RoleRegistry::new(deployer);

        registry.revoke_role(&deployer, &deployer, Role::Admin).unwrap();
        assert_eq!(registry.count_holders(Role::Admin), 0);

        // Registry is now frozen: nobody can grant anything.
        let result = registry.grant_role(&deployer, addr(2), Role::Signer);
        assert!(matches!(result, Err(RoleError::Unauthorized { .. })));
    }

    #[test]
    fn serde_roundtrip_preserves_roles() {
        let deployer = addr(1);
        let signer = addr(2);
        let mut registry = RoleRegistry::new(deployer);
        registry.grant_role(&deployer, signer, Role::Signer).unwrap();

        let json = serde_json::to_string(&registry).expect("serialize");
        let recovered: RoleRegistry = serde_json::from_str(&json).expect("deserialize");
        assert!(recovered.has_role(&deployer, Role::Admin));
        assert!(recovered.has_role(&signer, Role::Signer));
    }
}
