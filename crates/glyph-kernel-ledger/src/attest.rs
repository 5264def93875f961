//! Batch attestation: one checkable token covering many leaf hashes.
//!
//! The backend is a seam. The default [`DigestAttestation`] derives
//! proof bytes from a hash over the sorted inputs: reproducible and
//! independently checkable from the same inputs, and explicitly *not* a
//! zero-knowledge proof. A real succinct-proof backend plugs in behind
//! [`AttestationBackend`] without touching the checkable parts of the
//! contract (inputs, limits, recompute-verify).

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use glyph_kernel_core::{Category, GlyphHash};

use crate::error::LedgerError;

/// Default cap on leaves per attestation.
pub const DEFAULT_BATCH_LIMIT: usize = 512;

/// Domain prefix for attestation digests.
const ATTEST_DOMAIN: &[u8] = b"glyph-attest-v0:";

/// Produces and checks proof bytes over a sorted, deduplicated leaf set.
pub trait AttestationBackend: Send + Sync {
    /// Derive proof bytes for the batch. `leaves` is sorted and free of
    /// duplicates.
    fn attest(&self, category: Category, leaves: &[GlyphHash]) -> Bytes;

    /// Check proof bytes against the batch.
    fn check(&self, category: Category, leaves: &[GlyphHash], proof: &[u8]) -> bool;
}

/// The deterministic in-process backend: Blake3 over the domain tag, the
/// category name, and the sorted leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestAttestation;

impl DigestAttestation {
    fn digest(&self, category: Category, leaves: &[GlyphHash]) -> GlyphHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(ATTEST_DOMAIN);
        hasher.update(category.as_str().as_bytes());
        hasher.update(b":");
        for leaf in leaves {
            hasher.update(&leaf.0);
        }
        GlyphHash(*hasher.finalize().as_bytes())
    }
}

impl AttestationBackend for DigestAttestation {
    fn attest(&self, category: Category, leaves: &[GlyphHash]) -> Bytes {
        Bytes::copy_from_slice(&self.digest(category, leaves).0)
    }

    fn check(&self, category: Category, leaves: &[GlyphHash], proof: &[u8]) -> bool {
        proof == self.digest(category, leaves).0
    }
}

/// A bulk-admission attestation over a leaf batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Identifier derived from the proof bytes.
    pub id: GlyphHash,
    /// Category the leaves belong to.
    pub category: Category,
    /// The attested leaves, sorted and deduplicated.
    pub inputs: Vec<GlyphHash>,
    /// Backend-produced proof bytes.
    pub proof_bytes: Bytes,
}

/// The batch-attestation service.
pub struct BatchAttestor<B = DigestAttestation> {
    backend: B,
    batch_limit: usize,
}

impl BatchAttestor<DigestAttestation> {
    /// Service with the default backend and batch limit.
    pub fn new() -> Self {
        Self::with_backend(DigestAttestation, DEFAULT_BATCH_LIMIT)
    }
}

impl Default for BatchAttestor<DigestAttestation> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: AttestationBackend> BatchAttestor<B> {
    /// Service over a custom backend.
    pub fn with_backend(backend: B, batch_limit: usize) -> Self {
        Self {
            backend,
            batch_limit,
        }
    }

    /// The configured batch limit.
    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    /// Attest a batch of leaf hashes.
    ///
    /// The limit applies to the batch as submitted; inputs are then
    /// sorted and deduplicated before the backend sees them.
    pub fn attest(
        &self,
        category: Category,
        leaves: &[GlyphHash],
    ) -> Result<Attestation, LedgerError> {
        if leaves.len() > self.batch_limit {
            return Err(LedgerError::BatchTooLarge {
                len: leaves.len(),
                limit: self.batch_limit,
            });
        }

        let mut inputs = leaves.to_vec();
        inputs.sort();
        inputs.dedup();

        let proof_bytes = self.backend.attest(category, &inputs);
        let id = GlyphHash::hash_with_domain(ATTEST_DOMAIN, &proof_bytes);

        Ok(Attestation {
            id,
            category,
            inputs,
            proof_bytes,
        })
    }

    /// Recompute and compare.
    pub fn verify(&self, attestation: &Attestation) -> bool {
        self.backend.check(
            attestation.category,
            &attestation.inputs,
            &attestation.proof_bytes,
        )
    }
}
