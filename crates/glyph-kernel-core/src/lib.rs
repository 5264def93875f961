//! # Glyph Kernel Core
//!
//! Pure primitives for the Glyph Kernel: symbols, composition protocols,
//! the composer, and canonicalization.
//!
//! This crate contains no I/O, no async, no consensus. It is pure
//! computation over content-addressed symbolic data.
//!
//! ## Key Types
//!
//! - [`AtomicSymbol`] - The smallest fixed-domain symbolic unit
//! - [`CompositeSymbol`] - Exactly 3 atomics under a [`CompositionKind`]
//! - [`AggregateSymbol`] - Exactly 3 composites under a [`ProgramType`]
//! - [`GlyphKey`] - Content-addressed identifier (Blake3 hash)
//! - [`SymbolRegistry`] - The per-instance symbol store
//!
//! ## Canonicalization
//!
//! All content keys are derived from deterministic CBOR. See [`canonical`].

pub mod canonical;
pub mod category;
pub mod composer;
pub mod error;
pub mod hash;
pub mod protocol;
pub mod registry;
pub mod symbol;
pub mod types;

pub use canonical::{canonical_bytes, content_hash};
pub use category::{Category, CategoryRange, CategoryTable};
pub use composer::{compose_meta, compose_ultra, ComposerConfig};
pub use error::ValidationError;
pub use hash::GlyphHash;
pub use protocol::{CompositionProtocol, ProtocolTable};
pub use registry::SymbolRegistry;
pub use symbol::{
    AggregateSymbol, AtomicSymbol, CompositeSymbol, CompositionKind, ProgramType,
};
pub use types::{GlyphKey, SymbolValue, WriterId};
