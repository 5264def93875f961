//! Error types for the ledger crate.

use thiserror::Error;

use glyph_kernel_core::{Category, GlyphHash};

use crate::lineage::EntryId;

/// Errors from Merkle, lineage, and attestation operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The leaf is not a member of the category's current tree.
    #[error("leaf {leaf} not found in the {category} tree")]
    LeafNotFound { category: Category, leaf: GlyphHash },

    /// An attestation batch exceeded the configured limit.
    #[error("batch of {len} leaves exceeds the attestation limit of {limit}")]
    BatchTooLarge { len: usize, limit: usize },

    /// A lineage append referenced a dependency that is not in the log.
    #[error("unknown causal dependency {0}")]
    UnknownDependency(EntryId),

    /// An imported tree's recomputed root disagrees with the document.
    #[error("root mismatch for {category}: document says {expected}, leaves give {computed}")]
    RootMismatch {
        category: Category,
        expected: GlyphHash,
        computed: GlyphHash,
    },
}
