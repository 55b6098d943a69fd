//! # Caller Identity
//!
//! Every operation on the vault is invoked *by* someone, and the hosting
//! environment tells us who: an [`Address`] — an opaque 32-byte identity
//! value (an account address, a public key hash, whatever the host uses).
//! The vault trusts this value as delivered; verifying that the caller
//! actually controls the identity (signature checking, session auth) is
//! the host's responsibility, not ours.
//!
//! The vault interprets nothing about an address beyond equality. It is
//! a pure lookup key into the role registry and the confirmation set.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// An opaque, comparable caller identity.
///
/// Immutable and `Copy` — addresses are passed by value everywhere. Two
/// addresses are the same caller iff their bytes are equal; no other
/// structure is read out of them.
///
/// Serializes as a 64-char hex string so that addresses can be used as
/// map keys in JSON.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 32]);

impl Address {
    /// Creates an address from raw 32-byte identity material.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 32-byte identity.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the full hex-encoded address.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex-encoded address. The input must decode to exactly
    /// 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(de::Error::custom)
    }
}

impl fmt::Display for Address {
    /// Truncated hex form for logs: first 8 hex chars + `…`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}…", &self.to_hex()[..8])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let addr = Address::from_bytes([0xAB; 32]);
        let hex = addr.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Address::from_hex(&hex).unwrap(), addr);
    }

    #[test]
    fn short_hex_rejected() {
        assert!(Address::from_hex("abcd").is_err());
    }

    #[test]
    fn non_hex_rejected() {
        assert!(Address::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn equality_is_byte_equality() {
        let a = Address::from_bytes([1; 32]);
        let b = Address::from_bytes([1; 32]);
        let c = Address::from_bytes([2; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_is_truncated() {
        let addr = Address::from_bytes([0xFF; 32]);
        assert_eq!(addr.to_string(), "ffffffff…");
    }

    #[test]
    fn serde_roundtrip() {
        let addr = Address::from_bytes([7; 32]);
        let json = serde_json::to_string(&addr).expect("serialize");
        let back: Address = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, addr);
    }
}
