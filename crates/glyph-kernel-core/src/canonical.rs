//! Canonical CBOR encoding for deterministic content addressing.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (derived quantities like size estimates are never hashed)
//!
//! The canonical encoding is critical: it ensures that the same
//! composition produces identical bytes (and thus identical content keys)
//! across instances, which is what makes ledger roots reproducible.

use ciborium::value::Value;

use crate::hash::GlyphHash;
use crate::symbol::{CompositionKind, ProgramType};
use crate::types::{GlyphKey, SymbolValue};

/// Content schema version, the first field of every content map.
pub const CONTENT_VERSION: u8 = 0;

/// Domain prefix for composite content keys.
pub const META_DOMAIN: &[u8] = b"glyph-meta-v0:";

/// Domain prefix for aggregate content keys.
pub const ULTRA_DOMAIN: &[u8] = b"glyph-ultra-v0:";

/// Content field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const VERSION: u64 = 0;
    pub const TAG: u64 = 1;
    pub const MEMBERS: u64 = 2;
}

/// Compute the content key of a composite from its identity fields.
pub fn meta_key(kind: CompositionKind, members: &[SymbolValue; 3]) -> GlyphKey {
    let value = Value::Map(vec![
        (
            Value::Integer(keys::VERSION.into()),
            Value::Integer(CONTENT_VERSION.into()),
        ),
        (
            Value::Integer(keys::TAG.into()),
            Value::Integer(kind.to_u8().into()),
        ),
        (
            Value::Integer(keys::MEMBERS.into()),
            Value::Array(
                members
                    .iter()
                    .map(|m| Value::Integer(m.get().into()))
                    .collect(),
            ),
        ),
    ]);
    GlyphKey(content_hash(META_DOMAIN, &value).0)
}

/// Compute the content key of an aggregate from its identity fields.
pub fn ultra_key(program_type: &ProgramType, members: &[GlyphKey; 3]) -> GlyphKey {
    let value = Value::Map(vec![
        (
            Value::Integer(keys::VERSION.into()),
            Value::Integer(CONTENT_VERSION.into()),
        ),
        (
            Value::Integer(keys::TAG.into()),
            Value::Text(program_type.as_str().to_string()),
        ),
        (
            Value::Integer(keys::MEMBERS.into()),
            Value::Array(
                members
                    .iter()
                    .map(|m| Value::Bytes(m.0.to_vec()))
                    .collect(),
            ),
        ),
    ]);
    GlyphKey(content_hash(ULTRA_DOMAIN, &value).0)
}

/// Hash a canonical value under a domain prefix.
pub fn content_hash(domain: &[u8], value: &Value) -> GlyphHash {
    GlyphHash::hash_with_domain(domain, &canonical_bytes(value))
}

/// Encode a CBOR Value to canonical bytes.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            encode_integer(buf, *i);
        }
        Value::Bytes(b) => {
            encode_bytes(buf, b);
        }
        Value::Text(s) => {
            encode_text(buf, s);
        }
        Value::Array(arr) => {
            encode_array(buf, arr);
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
        }
        Value::Null => {
            buf.push(0xf6);
        }
        Value::Float(_) => {
            panic!("floats not supported in canonical encoding");
        }
        _ => {
            panic!("unsupported CBOR value type");
        }
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        // Major type 0: unsigned integer
        encode_uint(buf, 0, n as u64);
    } else {
        // Major type 1: negative integer
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    // Encode all keys first to sort by encoded bytes
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    // Sort by encoded key bytes (lexicographic)
    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    // Write map header
    encode_uint(buf, 5, key_value_pairs.len() as u64);

    // Write sorted key-value pairs
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
