//! # Threshold-Custody Vault
//!
//! A custody vault that gates movement of a single bound fungible asset
//! behind a role-based, threshold-confirmation authorization scheme:
//!
//! - **Role Registry** — Admin holders configure the vault and manage
//!   membership; Signer holders jointly authorize the one privileged
//!   action.
//! - **Asset Binding** — the vault is bound to exactly one fungible
//!   asset, exactly once, by an Admin. No rebinding exists.
//! - **Emergency Withdrawal** — Signers confirm independently; the
//!   threshold-th distinct confirmation atomically moves the vault's
//!   entire balance to a recipient fixed at construction and resets the
//!   round.
//!
//! ```text
//! identity.rs — Address: opaque caller identity
//! registry.rs — Role, RoleRegistry: Admin-gated capability map
//! asset.rs    — FungibleAsset trait + in-memory TokenLedger
//! vault.rs    — Vault: binding guard, balance, threshold state machine
//! shared.rs   — SharedVault: mutex-guarded handle for concurrent hosts
//! ```
//!
//! ## Design Principles
//!
//! 1. Capability checks are explicit lookups at the top of every gated
//!    operation — no inheritance, no dynamic dispatch for authorization.
//! 2. Every invocation is all-or-nothing. A failed operation leaves no
//!    partial state behind, including the execute path: a confirmation
//!    whose transfer fails is rolled back with it.
//! 3. The asset is an abstract collaborator. The vault consumes
//!    `balance_of` and `transfer` and treats both as fallible; it never
//!    assumes an asset implementation.
//! 4. Caller identity is supplied by the host and trusted as-is.
//!    Signature verification is the host's job.

pub mod asset;
pub mod identity;
pub mod registry;
pub mod shared;
pub mod vault;

pub use asset::{AssetError, FungibleAsset, TokenLedger};
pub use identity::Address;
pub use registry::{Role, RoleError, RoleRegistry};
pub use shared::SharedVault;
pub use vault::{RoundPhase, Vault, VaultConfig, VaultError};
