//! # Glyph Kernel Ledger
//!
//! The verifiable history of admitted glyphs: per-category Merkle trees
//! with inclusion proofs, a CRDT-style causal lineage log, and the
//! batch-attestation service.
//!
//! Nothing in this crate decides *whether* an entry is admitted; that is
//! the consensus coordinator's job. This crate records what was admitted
//! and makes the record checkable.

pub mod attest;
pub mod error;
pub mod lineage;
pub mod merkle;

pub use attest::{
    Attestation, AttestationBackend, BatchAttestor, DigestAttestation, DEFAULT_BATCH_LIMIT,
};
pub use error::LedgerError;
pub use lineage::{EntryId, LineageEntry, LineageLog, LineageOp, VectorClock};
pub use merkle::{CategoryTree, Direction, MerkleForest, MerkleProof};
