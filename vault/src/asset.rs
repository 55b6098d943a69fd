//! # Fungible Asset Interface
//!
//! The vault custodies exactly one fungible asset, but it does not
//! implement one — it consumes the [`FungibleAsset`] trait and treats
//! the resource behind it as an external collaborator that may fail.
//! Whatever the host binds (an on-chain token adapter, a bank-ledger
//! shim, the in-memory [`TokenLedger`] below) only has to answer two
//! questions: how much does an owner hold, and can value move.
//!
//! All amounts are `u64` in smallest-unit denomination. No floating
//! point, no decimals in arithmetic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by a fungible-asset resource.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The source account does not hold enough to cover the transfer.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Current balance of the source account.
        available: u64,
        /// Amount the transfer required.
        requested: u64,
    },

    /// Arithmetic overflow while crediting an account.
    #[error("balance overflow: current {current}, credit {credit}")]
    Overflow {
        /// Balance before the failed credit.
        current: u64,
        /// The amount that caused the overflow.
        credit: u64,
    },

    /// The resource refused the operation for a reason of its own
    /// (asset frozen, compliance hold, downstream outage).
    #[error("asset rejected the operation: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// FungibleAsset
// ---------------------------------------------------------------------------

/// The asset resource the vault is bound to.
///
/// Both operations are fallible; the vault propagates any failure as
/// `TransferFailed` and rolls its own state back. Implementations must
/// apply a transfer atomically — debit and credit together or not at
/// all.
pub trait FungibleAsset: Send {
    /// Returns the balance currently held by `owner`.
    fn balance_of(&self, owner: &Address) -> Result<u64, AssetError>;

    /// Moves `amount` from `from` to `to`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), AssetError>;
}

// ---------------------------------------------------------------------------
// TokenLedger
// ---------------------------------------------------------------------------

/// An in-memory fungible token ledger.
///
/// The reference [`FungibleAsset`] implementation: a balances map with
/// open minting and checked arithmetic. Production hosts bind an adapter
/// over their real asset instead; this one backs tests and local
/// deployments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Human-readable token name (e.g., "Mock Token").
    name: String,
    /// Ticker symbol (e.g., "MK").
    symbol: String,
    /// Per-address balances in smallest units.
    balances: HashMap<Address, u64>,
    /// Sum of all balances.
    total_supply: u64,
}

impl TokenLedger {
    /// Creates an empty ledger with the given display metadata.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            balances: HashMap::new(),
            total_supply: 0,
        }
    }

    /// Returns the token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the total minted supply.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Mints `amount` new units to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Overflow`] if the recipient balance or the
    /// total supply would exceed `u64::MAX`.
    pub fn mint(&mut self, to: Address, amount: u64) -> Result<(), AssetError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(AssetError::Overflow {
                current: self.total_supply,
                credit: amount,
            })?;

        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(AssetError::Overflow {
            current: *balance,
            credit: amount,
        })?;
        self.total_supply = new_supply;
        Ok(())
    }
}

impl FungibleAsset for TokenLedger {
    fn balance_of(&self, owner: &Address) -> Result<u64, AssetError> {
        Ok(self.balances.get(owner).copied().unwrap_or(0))
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), AssetError> {
        let available = self.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        // Self-transfer must not double-apply through two map entries.
        if from == to || amount == 0 {
            return Ok(());
        }

        let credited = self
            .balances
            .get(to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(AssetError::Overflow {
                current: self.balances.get(to).copied().unwrap_or(0),
                credit: amount,
            })?;

        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
