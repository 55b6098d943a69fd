//! # Threshold-Custody Vault
//!
//! The vault gates movement of a single bound fungible asset behind a
//! role-based, threshold-confirmation scheme. The lifecycle is:
//!
//! 1. **Deploy** — the deployer becomes sole Admin; threshold and the
//!    fixed withdrawal recipient are set at construction and never
//!    change.
//! 2. **Configure** — an Admin grants Signer (and further Admin) roles
//!    and binds the custodied asset exactly once.
//! 3. **Collect** — Signers independently confirm the one privileged
//!    action, emergency withdrawal. Confirmations accumulate; there is
//!    no timeout and no retraction.
//! 4. **Execute** — the threshold-th distinct Signer confirmation
//!    atomically transfers the vault's entire balance to the recipient
//!    and resets the round to empty.
//!
//! There is exactly one privileged action and it carries no payload —
//! "withdraw everything to the fixed recipient" — so no proposal ledger
//! or proposal identifiers exist. A round is the single global pending
//! action.
//!
//! ## Atomicity
//!
//! Each method is one indivisible read-modify-write over `&mut self`.
//! The "record confirmation, maybe execute, maybe reset" sequence in
//! [`Vault::confirm_emergency_withdraw`] either completes in full or
//! leaves the vault exactly as it was: if the execution transfer fails,
//! the caller's just-recorded confirmation is removed again. The asset
//! transfer is the last side effect of a successful round, after every
//! internal check has passed. Hosts that interleave calls from multiple
//! threads should hold a [`SharedVault`](crate::shared::SharedVault)
//! instead of a bare `Vault`.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::asset::{AssetError, FungibleAsset};
use crate::identity::Address;
use crate::registry::{Role, RoleError, RoleRegistry};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
///
/// Every failure aborts the whole invocation with no partial state
/// change; the caller corrects the condition and reinvokes.
#[derive(Debug, Error)]
pub enum VaultError {
    /// An asset-touching operation was attempted before [`Vault::bind_asset`].
    #[error("asset is not bound")]
    AssetNotBound,

    /// A second bind attempt. The binding is immutable once set.
    #[error("asset is already bound")]
    AlreadyBound,

    /// The caller does not hold the role the operation requires.
    #[error("unauthorized: {caller} is missing role {required}")]
    Unauthorized {
        /// The address that attempted the operation.
        caller: Address,
        /// The role the operation requires.
        required: Role,
    },

    /// The caller already confirmed in the active round.
    #[error("{caller} has already confirmed this round")]
    AlreadyConfirmed {
        /// The signer that tried to confirm twice.
        caller: Address,
    },

    /// The asset resource rejected a balance read or the execution
    /// transfer. The confirmation state has been rolled back.
    #[error("asset operation failed")]
    TransferFailed {
        /// The failure reported by the asset resource.
        #[source]
        source: AssetError,
    },

    /// The configured threshold was zero. At least one confirmation is
    /// always required.
    #[error("invalid threshold: 0 (must be at least 1)")]
    InvalidThreshold,
}

impl From<RoleError> for VaultError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::Unauthorized { caller, required } => {
                VaultError::Unauthorized { caller, required }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the current withdrawal round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No confirmations recorded this round.
    Idle,
    /// Between one and threshold-minus-one confirmations recorded.
    /// A round can stay here indefinitely.
    Collecting,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Idle => write!(f, "Idle"),
            RoundPhase::Collecting => write!(f, "Collecting"),
        }
    }
}

/// Construction-time vault parameters. All of them are fixed for the
/// vault's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// The address under which the vault itself holds custodied funds
    /// on the asset's ledger.
    pub vault_address: Address,
    /// The fixed destination for emergency-withdrawn funds.
    pub recipient: Address,
    /// Minimum number of distinct Signer confirmations required to
    /// execute. Must be at least 1. May exceed the current signer
    /// count, in which case a round simply cannot complete until
    /// enough signers are granted.
    pub threshold: u32,
}

/// A threshold-custody vault for a single fungible asset.
///
/// Holds the role registry, the one-time asset binding, and the
/// confirmation state of the current emergency-withdraw round. The
/// bound asset is a live resource handle and is not serialized;
/// snapshot the [`registry`](Self::registry) and [`config`](Self::config)
/// and re-bind on restore.
pub struct Vault {
    /// Unique identifier for this vault instance.
    id: String,
    /// Fixed construction parameters.
    config: VaultConfig,
    /// Who holds Admin and Signer capabilities.
    registry: RoleRegistry,
    /// The bound asset resource. `None` until [`Vault::bind_asset`];
    /// immutable afterwards.
    asset: Option<Box<dyn FungibleAsset>>,
    /// Signers that have confirmed the current round. Cleared to empty,
    /// never partially, when a round executes.
    confirmations: HashSet<Address>,
    /// Timestamp when the vault was created.
    created_at: DateTime<Utc>,
    /// Timestamp of the most recent successful state change.
    updated_at: DateTime<Utc>,
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("bound", &self.asset.is_some())
            .field("confirmations", &self.confirmations)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl Vault {
    /// Creates a new vault with `deployer` as sole Admin and no asset
    /// bound.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidThreshold`] if `config.threshold`
    /// is zero.
    pub fn new(deployer: Address, config: VaultConfig) -> Result<Self, VaultError> {
        if config.threshold == 0 {
            return Err(VaultError::InvalidThreshold);
        }

        let now = Utc::now();
        let vault = Self {
            id: Uuid::new_v4().to_string(),
            registry: RoleRegistry::new(deployer),
            config,
            asset: None,
            confirmations: HashSet::new(),
            created_at: now,
            updated_at: now,
        };
        tracing::info!(
            id = %vault.id,
            deployer = %deployer,
            threshold = vault.config.threshold,
            recipient = %vault.config.recipient,
            "vault created"
        );
        Ok(vault)
    }

    // -- views ---------------------------------------------------------------

    /// Returns the vault's unique instance id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the fixed construction parameters.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Returns the confirmation threshold.
    pub fn threshold(&self) -> u32 {
        self.config.threshold
    }

    /// Returns the fixed withdrawal recipient.
    pub fn recipient(&self) -> Address {
        self.config.recipient
    }

    /// Returns the address under which the vault holds funds.
    pub fn vault_address(&self) -> Address {
        self.config.vault_address
    }

    /// Returns `true` once an asset has been bound.
    pub fn is_bound(&self) -> bool {
        self.asset.is_some()
    }

    /// Returns the role registry for inspection or snapshotting.
    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Returns `true` if `who` currently holds `role`.
    pub fn has_role(&self, who: &Address, role: Role) -> bool {
        self.registry.has_role(who, role)
    }

    /// Returns where the current round stands.
    pub fn phase(&self) -> RoundPhase {
        if self.confirmations.is_empty() {
            RoundPhase::Idle
        } else {
            RoundPhase::Collecting
        }
    }

    /// Returns the number of distinct confirmations in the current round.
    pub fn confirmation_count(&self) -> usize {
        self.confirmations.len()
    }

    /// Returns `true` if `who` has confirmed the current round.
    pub fn has_confirmed(&self, who: &Address) -> bool {
        self.confirmations.contains(who)
    }

    /// Returns when the vault was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the last successful state change.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // -- role management -----------------------------------------------------

    /// Grants `role` to `who`. Admin-only; idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] if `caller` does not hold
    /// Admin.
    pub fn grant_role(
        &mut self,
        caller: &Address,
        who: Address,
        role: Role,
    ) -> Result<(), VaultError> {
        self.registry.grant_role(caller, who, role)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Revokes `role` from `who`. Admin-only; idempotent.
    ///
    /// An Admin may revoke their own Admin role; if they were the last
    /// Admin, configuration is permanently frozen (see
    /// [`RoleRegistry::revoke_role`]).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] if `caller` does not hold
    /// Admin.
    pub fn revoke_role(
        &mut self,
        caller: &Address,
        who: &Address,
        role: Role,
    ) -> Result<(), VaultError> {
        self.registry.revoke_role(caller, who, role)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    // -- asset binding -------------------------------------------------------

    /// Binds the custodied asset. Admin-only, and allowed exactly once:
    /// rebinding is not supported, so an Admin cannot redirect custody
    /// mid-operation.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Unauthorized`] if `caller` does not hold
    /// Admin. Returns [`VaultError::AlreadyBound`] if an asset is
    /// already bound; the existing binding is unchanged.
    pub fn bind_asset(
        &mut self,
        caller: &Address,
        asset: Box<dyn FungibleAsset>,
    ) -> Result<(), VaultError> {
        self.registry.require_admin(caller)?;
        if self.asset.is_some() {
            return Err(VaultError::AlreadyBound);
        }

        self.asset = Some(asset);
        self.updated_at = Utc::now();
        tracing::info!(id = %self.id, admin = %caller, "asset bound");
        Ok(())
    }

    // -- balance -------------------------------------------------------------

    /// Returns the asset balance currently held by the vault.
    ///
    /// Open to any caller — balance inspection carries no role
    /// restriction.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AssetNotBound`] if no asset is bound.
    /// Returns [`VaultError::TransferFailed`] if the asset resource
    /// fails the balance read.
    pub fn balance(&self) -> Result<u64, VaultError> {
        let asset = self.asset.as_ref().ok_or(VaultError::AssetNotBound)?;
        asset
            .balance_of(&self.config.vault_address)
            .map_err(|source| VaultError::TransferFailed { source })
    }

    // -- emergency withdraw --------------------------------------------------

    /// Records `caller`'s confirmation of the emergency withdrawal and,
    /// when the threshold-th distinct Signer confirms, executes it:
    /// the vault's entire balance moves to the fixed recipient and the
    /// round resets to empty.
    ///
    /// Checks run in a fixed order: binding, then role, then replay.
    /// An unbound vault rejects every caller identically, regardless of
    /// role. Confirmations are unordered — execution fires on the
    /// threshold-th *distinct* signer, whoever that happens to be in
    /// the host's sequential call order.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AssetNotBound`] if no asset is bound.
    /// Returns [`VaultError::Unauthorized`] if `caller` does not hold
    /// Signer. Returns [`VaultError::AlreadyConfirmed`] if `caller`
    /// already confirmed this round. Returns
    /// [`VaultError::TransferFailed`] if the asset rejects the
    /// execution; the caller's confirmation is rolled back and the
    /// round stays collecting.
    pub fn confirm_emergency_withdraw(&mut self, caller: Address) -> Result<(), VaultError> {
        // Binding is checked before any role or replay logic: an unset
        // vault rejects every caller identically.
        let Some(asset) = self.asset.as_mut() else {
            return Err(VaultError::AssetNotBound);
        };
        if !self.registry.has_role(&caller, Role::Signer) {
            return Err(VaultError::Unauthorized {
                caller,
                required: Role::Signer,
            });
        }
        if self.confirmations.contains(&caller) {
            return Err(VaultError::AlreadyConfirmed { caller });
        }

        self.confirmations.insert(caller);
        let count = self.confirmations.len();
        tracing::info!(
            id = %self.id,
            signer = %caller,
            count,
            threshold = self.config.threshold,
            "emergency withdrawal confirmed"
        );

        if count < self.config.threshold as usize {
            self.updated_at = Utc::now();
            return Ok(());
        }

        // Threshold reached: execute. The transfer is the last side
        // effect; if the asset rejects it, undo the confirmation just
        // recorded so the round is not left half-committed.
        let executed = asset
            .balance_of(&self.config.vault_address)
            .and_then(|amount| {
                asset.transfer(&self.config.vault_address, &self.config.recipient, amount)?;
                Ok(amount)
            });

        match executed {
            Ok(amount) => {
                self.confirmations.clear();
                self.updated_at = Utc::now();
                tracing::info!(
                    id = %self.id,
                    amount,
                    recipient = %self.config.recipient,
                    "emergency withdrawal executed"
                );
                Ok(())
            }
            Err(source) => {
                self.confirmations.remove(&caller);
                tracing::warn!(
                    id = %self.id,
                    signer = %caller,
                    error = %source,
                    "execution transfer failed; confirmation rolled back"
                );
                Err(VaultError::TransferFailed { source })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
