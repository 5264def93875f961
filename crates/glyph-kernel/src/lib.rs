//! # Glyph Kernel
//!
//! Unified API for the Glyph Kernel: a registry of compact,
//! content-addressed symbolic glyphs whose compositions are validated
//! against semantic-type protocols and admitted into a verifiable,
//! quorum-gated ledger.
//!
//! The [`GlyphSystem`] brings together:
//!
//! - the symbol registry, composition protocols, and composer
//!   (`glyph-kernel-core`)
//! - per-category Merkle trees, the causal lineage log, and batch
//!   attestation (`glyph-kernel-ledger`)
//! - the quorum-weighted consensus gate (`glyph-kernel-consensus`)
//! - the entropy governor throttling admission by complexity
//!
//! ## Admission flow
//!
//! ```text
//! compose (registry + protocols)
//!   -> entropy budget gate
//!   -> consensus round at a chosen level
//!   -> Merkle insert + lineage append   (one atomicity boundary)
//! ```
//!
//! Callers may later request an inclusion proof for any committed leaf,
//! or a batch attestation over many leaves at once. [`ExportDocument`]
//! is the only persisted format.

pub mod error;
pub mod export;
pub mod governor;
pub mod system;

pub use error::{AdmissionStage, KernelError, Result};
pub use export::{ExportDocument, EXPORT_VERSION};
pub use governor::{EntropyGovernor, GovernorConfig};
pub use system::{AdmissionReceipt, GlyphSystem, GlyphSystemConfig};

// Re-export the member crates' public surfaces under one roof, the way
// downstream callers consume them.
pub use glyph_kernel_consensus::{
    transport::memory::LocalTransport, ConsensusConfig, ConsensusError, ConsensusLevel,
    ConsensusNode, ConsensusTransport, Coordinator, NodeId, NodeRole, Proposal, RoundPhase,
    RoundRecord, Tally, Vote, VoteDecision,
};
pub use glyph_kernel_core::{
    AggregateSymbol, AtomicSymbol, Category, CategoryRange, CategoryTable, ComposerConfig,
    CompositeSymbol, CompositionKind, CompositionProtocol, GlyphHash, GlyphKey, ProgramType,
    ProtocolTable, SymbolRegistry, SymbolValue, ValidationError, WriterId,
};
pub use glyph_kernel_ledger::{
    Attestation, AttestationBackend, BatchAttestor, CategoryTree, DigestAttestation, Direction,
    EntryId, LedgerError, LineageEntry, LineageLog, LineageOp, MerkleForest, MerkleProof,
    VectorClock, DEFAULT_BATCH_LIMIT,
};
