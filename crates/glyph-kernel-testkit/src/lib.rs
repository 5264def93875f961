//! # Glyph Kernel Testkit
//!
//! Shared fixtures, proptest generators, and deterministic vectors for
//! testing the Glyph Kernel crates and anything embedding them.

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, TestFixture};
pub use vectors::{generate_all_vectors, GlyphVector};
