//! Proptest strategies for kernel types.

use proptest::prelude::*;

use glyph_kernel::{Category, CompositionKind, GlyphHash, SymbolValue};

/// An in-domain symbol value.
pub fn arb_symbol_value() -> impl Strategy<Value = SymbolValue> {
    (0u32..=SymbolValue::MAX).prop_map(SymbolValue)
}

/// A registrable complexity (>= 1, small enough to compose).
pub fn arb_complexity() -> impl Strategy<Value = u32> {
    1u32..=8
}

/// Any composition kind.
pub fn arb_kind() -> impl Strategy<Value = CompositionKind> {
    prop::sample::select(CompositionKind::ALL.to_vec())
}

/// Any category.
pub fn arb_category() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

/// An arbitrary leaf hash.
pub fn arb_leaf_hash() -> impl Strategy<Value = GlyphHash> {
    any::<[u8; 32]>().prop_map(GlyphHash::from_bytes)
}

/// A non-empty batch of distinct leaf hashes.
pub fn arb_leaf_batch(max: usize) -> impl Strategy<Value = Vec<GlyphHash>> {
    prop::collection::btree_set(any::<[u8; 32]>(), 1..max)
        .prop_map(|set| set.into_iter().map(GlyphHash::from_bytes).collect())
}
