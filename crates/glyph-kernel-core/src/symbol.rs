//! Symbol records: the three levels of the composition hierarchy.
//!
//! An atomic symbol is an immutable, registered unit. Composites and
//! aggregates are immutable once built; changes are represented as new
//! compositions with new content keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::Category;
use crate::types::{GlyphKey, SymbolValue};

/// The smallest symbolic unit: a fixed-domain value with meaning.
///
/// Immutable once registered; unique per value for the registry lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicSymbol {
    /// The 3-byte domain value.
    pub value: SymbolValue,

    /// Category derived from the value-range table at registration.
    pub category: Category,

    /// Complexity weight (always >= 1).
    pub complexity: u32,

    /// Human-readable meaning.
    pub meaning: String,

    /// Declared dependencies on other atomic values. Metadata only; the
    /// kernel imposes no ordering on them.
    pub dependencies: Vec<SymbolValue>,
}

/// How three members are combined into a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompositionKind {
    /// Members execute one after another.
    Sequential = 0,
    /// Members execute side by side.
    Parallel = 1,
    /// First member governs the nested remainder.
    Hierarchical = 2,
    /// Members form a data pipeline.
    Pipeline = 3,
}

impl CompositionKind {
    /// All kinds, in tag order.
    pub const ALL: [CompositionKind; 4] = [
        CompositionKind::Sequential,
        CompositionKind::Parallel,
        CompositionKind::Hierarchical,
        CompositionKind::Pipeline,
    ];

    /// Convert to u8 for canonical encoding.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Sequential),
            1 => Some(Self::Parallel),
            2 => Some(Self::Hierarchical),
            3 => Some(Self::Pipeline),
            _ => None,
        }
    }

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionKind::Sequential => "sequential",
            CompositionKind::Parallel => "parallel",
            CompositionKind::Hierarchical => "hierarchical",
            CompositionKind::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for CompositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Program-type tag on an aggregate.
///
/// Free-form, but tags matching a [`CompositionKind`] name take that
/// kind's join rule and size multiplier; anything else falls back to the
/// `A + B + C` join and a 1.0 multiplier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramType(String);

impl ProgramType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The composition kind this tag names, if any.
    pub fn flow(&self) -> Option<CompositionKind> {
        CompositionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == self.0)
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CompositionKind> for ProgramType {
    fn from(kind: CompositionKind) -> Self {
        Self(kind.as_str().to_string())
    }
}

impl From<&str> for ProgramType {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

/// A validated composition of exactly 3 atomic symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeSymbol {
    /// Content address: Blake3 over canonical (kind, members).
    pub key: GlyphKey,

    /// The composition kind.
    pub kind: CompositionKind,

    /// Member atomic values, in composition order.
    pub members: [SymbolValue; 3],

    /// Description derived from member meanings by the kind's join rule.
    pub description: String,

    /// Sum of member complexities.
    pub complexity: u32,
}

impl CompositeSymbol {
    /// The ledger category of this composite: its lead member's category.
    pub fn lead_member(&self) -> SymbolValue {
        self.members[0]
    }
}

/// A composition of exactly 3 composite symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSymbol {
    /// Content address: Blake3 over canonical (program type, members).
    pub key: GlyphKey,

    /// Program-type tag.
    pub program_type: ProgramType,

    /// Member composite keys, in composition order.
    pub members: [GlyphKey; 3],

    /// Description derived from member descriptions.
    pub description: String,

    /// Sum of member complexities.
    pub complexity: u32,

    /// Estimated expansion size, capped at the configured maximum.
    /// Derived, never hashed.
    pub estimated_size: f64,
}

impl AggregateSymbol {
    pub fn lead_member(&self) -> GlyphKey {
        self.members[0]
    }
}
