//! Strong type definitions for the Glyph Kernel.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::hash::GlyphHash;

/// A fixed-domain symbol value in the 3-byte range `0 ..= 0xFF_FFFF`.
///
/// The domain bound is enforced at registration, not construction, so an
/// out-of-range value is representable but never registrable.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SymbolValue(pub u32);

impl SymbolValue {
    /// Largest registrable value (inclusive).
    pub const MAX: u32 = 0xFF_FFFF;

    /// Get the raw value.
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Whether this value lies inside the 3-byte domain.
    pub const fn in_domain(&self) -> bool {
        self.0 <= Self::MAX
    }

    /// Big-endian 3-byte encoding (valid only for in-domain values).
    pub fn to_be_bytes(&self) -> [u8; 3] {
        let b = self.0.to_be_bytes();
        [b[1], b[2], b[3]]
    }
}

impl fmt::Debug for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolValue({:#08x})", self.0)
    }
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.0)
    }
}

impl From<u32> for SymbolValue {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A 32-byte content address for a composed glyph.
///
/// Computed as Blake3 over the glyph's canonical content bytes. Two
/// compositions with the same members and kind have the same key.
/// Serializes as a hex string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphKey(pub [u8; 32]);

impl Serialize for GlyphKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for GlyphKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl GlyphKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero key (sentinel).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for GlyphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlyphKey({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for GlyphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for GlyphKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<GlyphHash> for GlyphKey {
    fn from(hash: GlyphHash) -> Self {
        Self(hash.0)
    }
}

/// Identity of a lineage writer.
///
/// Serializes as a hex string so it can key the vector-clock map in the
/// export document.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WriterId(pub [u8; 32]);

impl WriterId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a random writer ID.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }

    /// Derive a stable writer ID from a name.
    pub fn derive(name: &str) -> Self {
        Self(GlyphHash::hash_with_domain(b"glyph-writer-v0:", name.as_bytes()).0)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
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

impl Serialize for WriterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for WriterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for WriterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WriterId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for WriterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for WriterId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_value_domain() {
        assert!(SymbolValue(0).in_domain());
        assert!(SymbolValue(SymbolValue::MAX).in_domain());
        assert!(!SymbolValue(SymbolValue::MAX + 1).in_domain());
    }

    #[test]
    fn test_symbol_value_be_bytes() {
        assert_eq!(SymbolValue(0x010203).to_be_bytes(), [0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_glyph_key_hex_roundtrip() {
        let key = GlyphKey::from_bytes([0xab; 32]);
        let recovered = GlyphKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, recovered);
    }

    #[test]
    fn test_writer_id_derive_stable() {
        assert_eq!(WriterId::derive("node-a"), WriterId::derive("node-a"));
        assert_ne!(WriterId::derive("node-a"), WriterId::derive("node-b"));
    }

    #[test]
    fn test_symbol_value_display() {
        assert_eq!(format!("{}", SymbolValue(0x42)), "000042");
    }
}
