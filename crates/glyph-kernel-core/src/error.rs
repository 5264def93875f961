//! Error types for the Glyph Kernel Core.

use thiserror::Error;

use crate::category::Category;
use crate::symbol::CompositionKind;
use crate::types::GlyphKey;

/// Validation errors for registration and composition.
///
/// Every variant names the offending input so callers can tell exactly
/// which rule rejected a candidate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("symbol {value:#08x} is already registered")]
    DuplicateSymbol { value: u32 },

    #[error("symbol {value:#x} is outside the 3-byte domain (max {max:#x})")]
    OutOfRange { value: u32, max: u32 },

    #[error("symbol complexity must be at least 1")]
    ZeroComplexity,

    #[error("unknown symbol {value:#08x}")]
    UnknownSymbol { value: u32 },

    #[error("unknown composite {key}")]
    UnknownComposite { key: GlyphKey },

    #[error("no protocol allows composition kind {kind}")]
    NoMatchingProtocol { kind: CompositionKind },

    #[error("category {category} of symbol {value:#08x} is not allowed by protocol {protocol:?}")]
    CategoryViolation {
        value: u32,
        category: Category,
        protocol: String,
    },

    #[error("combined complexity {total} exceeds protocol {protocol:?} max {max}")]
    ComplexityExceeded {
        total: u32,
        max: u32,
        protocol: String,
    },

    #[error("category table invalid: {0}")]
    BadCategoryTable(String),
}
