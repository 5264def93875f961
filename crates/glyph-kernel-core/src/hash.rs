//! Hashing primitives for the Glyph Kernel.
//!
//! Wraps Blake3 with a strong type. Every content address, Merkle node,
//! and attestation digest in the system is a [`GlyphHash`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 32-byte Blake3 hash.
///
/// Serializes as a hex string so it can key JSON maps in the export
/// document.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphHash(pub [u8; 32]);

impl Serialize for GlyphHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for GlyphHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl GlyphHash {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Compute a domain-separated hash: Blake3(domain || data).
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain);
        hasher.update(data);
        Self(*hasher.finalize().as_bytes())
    }

    /// Hash the concatenation of two node hashes: Blake3(left || right).
    pub fn combine(left: &Self, right: &Self) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&left.0);
        hasher.update(&right.0);
        Self(*hasher.finalize().as_bytes())
    }

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

    /// The zero hash (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for GlyphHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlyphHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for GlyphHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for GlyphHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for GlyphHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"glyph data";
        let h1 = GlyphHash::hash(data);
        let h2 = GlyphHash::hash(data);
        assert_eq!(h1, h2);

        let h3 = GlyphHash::hash(b"different data");
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_domain_separation() {
        let data = b"same data";
        let h1 = GlyphHash::hash_with_domain(b"domain-a:", data);
        let h2 = GlyphHash::hash_with_domain(b"domain-b:", data);
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_combine_order_sensitive() {
        let a = GlyphHash::hash(b"a");
        let b = GlyphHash::hash(b"b");
        assert_ne!(GlyphHash::combine(&a, &b), GlyphHash::combine(&b, &a));
    }

    #[test]
    fn test_hex_roundtrip() {
        let h = GlyphHash::from_bytes([0x42; 32]);
        let recovered = GlyphHash::from_hex(&h.to_hex()).unwrap();
        assert_eq!(h, recovered);
    }

    #[test]
    fn test_debug_format() {
        let h = GlyphHash::from_bytes([0xcd; 32]);
        assert!(format!("{:?}", h).starts_with("GlyphHash("));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let h = GlyphHash::from_bytes([0xab; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        let back: GlyphHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
