//! The symbol registry: atomic registration plus retained compositions.
//!
//! Atomics are created once and never deleted. Composites and aggregates
//! are inserted by the composer and retained for the registry lifetime.
//! Iteration is in key order so export is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::CategoryTable;
use crate::error::ValidationError;
use crate::symbol::{AggregateSymbol, AtomicSymbol, CompositeSymbol};
use crate::types::{GlyphKey, SymbolValue};

/// Per-instance store of atomic symbols and retained compositions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRegistry {
    categories: CategoryTable,
    atomics: BTreeMap<SymbolValue, AtomicSymbol>,
    composites: BTreeMap<GlyphKey, CompositeSymbol>,
    aggregates: BTreeMap<GlyphKey, AggregateSymbol>,
}

impl SymbolRegistry {
    /// Create an empty registry over the given category table.
    pub fn new(categories: CategoryTable) -> Self {
        Self {
            categories,
            atomics: BTreeMap::new(),
            composites: BTreeMap::new(),
            aggregates: BTreeMap::new(),
        }
    }

    /// Create an empty registry over the standard category table.
    pub fn standard() -> Self {
        Self::new(CategoryTable::standard())
    }

    /// The category table in use.
    pub fn category_table(&self) -> &CategoryTable {
        &self.categories
    }

    // ─────────────────────────────────────────────────────────────────────
    // Atomic Symbols
    // ─────────────────────────────────────────────────────────────────────

    /// Register a new atomic symbol.
    ///
    /// Fails with `OutOfRange` if the value exceeds the 3-byte domain,
    /// `DuplicateSymbol` if the value is taken, and `ZeroComplexity` if
    /// the complexity invariant (>= 1) is violated.
    pub fn register(
        &mut self,
        value: SymbolValue,
        meaning: impl Into<String>,
        complexity: u32,
    ) -> Result<&AtomicSymbol, ValidationError> {
        self.register_with_deps(value, meaning, complexity, Vec::new())
    }

    /// Register a new atomic symbol with declared dependencies.
    pub fn register_with_deps(
        &mut self,
        value: SymbolValue,
        meaning: impl Into<String>,
        complexity: u32,
        dependencies: Vec<SymbolValue>,
    ) -> Result<&AtomicSymbol, ValidationError> {
        let category = self
            .categories
            .category_of(value)
            .ok_or(ValidationError::OutOfRange {
                value: value.get(),
                max: SymbolValue::MAX,
            })?;

        if complexity == 0 {
            return Err(ValidationError::ZeroComplexity);
        }

        if self.atomics.contains_key(&value) {
            return Err(ValidationError::DuplicateSymbol {
                value: value.get(),
            });
        }

        let symbol = AtomicSymbol {
            value,
            category,
            complexity,
            meaning: meaning.into(),
            dependencies,
        };

        Ok(self.atomics.entry(value).or_insert(symbol))
    }

    /// Look up an atomic symbol.
    pub fn lookup(&self, value: SymbolValue) -> Option<&AtomicSymbol> {
        self.atomics.get(&value)
    }

    /// Resolve an atomic symbol, failing with `UnknownSymbol` if absent.
    pub fn resolve(&self, value: SymbolValue) -> Result<&AtomicSymbol, ValidationError> {
        self.atomics
            .get(&value)
            .ok_or(ValidationError::UnknownSymbol {
                value: value.get(),
            })
    }

    /// Iterate atomic symbols in value order.
    pub fn atomics(&self) -> impl Iterator<Item = &AtomicSymbol> {
        self.atomics.values()
    }

    /// Number of registered atomics.
    pub fn atomic_count(&self) -> usize {
        self.atomics.len()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Retained Compositions
    // ─────────────────────────────────────────────────────────────────────

    /// Retain a composed composite. Re-inserting the same content key is
    /// idempotent (the composition is identical by construction).
    pub fn insert_composite(&mut self, composite: CompositeSymbol) -> &CompositeSymbol {
        self.composites.entry(composite.key).or_insert(composite)
    }

    /// Look up a retained composite by content key.
    pub fn composite(&self, key: &GlyphKey) -> Option<&CompositeSymbol> {
        self.composites.get(key)
    }

    /// Resolve a composite, failing with `UnknownComposite` if absent.
    pub fn resolve_composite(
        &self,
        key: &GlyphKey,
    ) -> Result<&CompositeSymbol, ValidationError> {
        self.composites
            .get(key)
            .ok_or(ValidationError::UnknownComposite { key: *key })
    }

    /// Retain a composed aggregate. Idempotent per content key.
    pub fn insert_aggregate(&mut self, aggregate: AggregateSymbol) -> &AggregateSymbol {
        self.aggregates.entry(aggregate.key).or_insert(aggregate)
    }

    /// Look up a retained aggregate by content key.
    pub fn aggregate(&self, key: &GlyphKey) -> Option<&AggregateSymbol> {
        self.aggregates.get(key)
    }

    /// Iterate retained composites in key order.
    pub fn composites(&self) -> impl Iterator<Item = &CompositeSymbol> {
        self.composites.values()
    }

    /// Iterate retained aggregates in key order.
    pub fn aggregates(&self) -> impl Iterator<Item = &AggregateSymbol> {
        self.aggregates.values()
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
