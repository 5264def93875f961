//! Error types for the Kernel.

use thiserror::Error;

use glyph_kernel_consensus::ConsensusError;
use glyph_kernel_core::{GlyphKey, ValidationError};
use glyph_kernel_ledger::LedgerError;

/// The admission stage a rejection came from, so callers can tell
/// "didn't fit protocol" from "refused by consensus" from "budget
/// exhausted" without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionStage {
    /// Composition or registration validation.
    Compose,
    /// The entropy-budget gate.
    Budget,
    /// The consensus vote.
    Consensus,
    /// The Merkle-insert + lineage-append pair.
    Commit,
}

/// Errors that can occur during Kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Validation error from registration or composition.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The entropy budget cannot cover this admission.
    #[error("insufficient entropy budget: cost {cost}, remaining {remaining}")]
    InsufficientBudget { cost: f64, remaining: f64 },

    /// Consensus error (no eligible nodes, or quorum not reached).
    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    /// Ledger error (proofs, attestation, lineage).
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The key names no retained composite or aggregate.
    #[error("unknown glyph {0}")]
    UnknownGlyph(GlyphKey),

    /// The Merkle-insert + lineage-append pair broke mid-commit. The
    /// failing half was rolled back, but callers must surface this
    /// distinctly and never retry it blindly.
    #[error("commit atomicity failure: {0}")]
    CommitAtomicityFailure(String),

    /// Filesystem error from the export/import path helpers.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Export document (de)serialization error.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl KernelError {
    /// The admission stage this error belongs to, if it is an admission
    /// error at all.
    pub fn stage(&self) -> Option<AdmissionStage> {
        match self {
            KernelError::Validation(_) | KernelError::UnknownGlyph(_) => {
                Some(AdmissionStage::Compose)
            }
            KernelError::InsufficientBudget { .. } => Some(AdmissionStage::Budget),
            KernelError::Consensus(_) => Some(AdmissionStage::Consensus),
            KernelError::Ledger(_) | KernelError::CommitAtomicityFailure(_) => {
                Some(AdmissionStage::Commit)
            }
            KernelError::Io(_) | KernelError::Codec(_) => None,
        }
    }

    /// Whether retrying the same admission (with backoff) can succeed
    /// without any other state change. True only for a missed quorum.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KernelError::Consensus(ConsensusError::QuorumNotReached { .. })
        )
    }
}

/// Result type for Kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_kernel_consensus::ConsensusLevel;

    #[test]
    fn test_stage_classification() {
        let budget = KernelError::InsufficientBudget {
            cost: 5.0,
            remaining: 1.0,
        };
        assert_eq!(budget.stage(), Some(AdmissionStage::Budget));

        let consensus =
            KernelError::Consensus(ConsensusError::NoEligibleNodes(ConsensusLevel::Local));
        assert_eq!(consensus.stage(), Some(AdmissionStage::Consensus));

        let commit = KernelError::CommitAtomicityFailure("lineage append failed".into());
        assert_eq!(commit.stage(), Some(AdmissionStage::Commit));
    }

    #[test]
    fn test_only_missed_quorum_is_retryable() {
        let quorum = KernelError::Consensus(ConsensusError::QuorumNotReached {
            yes_weight: 1.0,
            eligible_weight: 4.2,
            threshold: 0.67,
        });
        assert!(quorum.is_retryable());

        let no_nodes =
            KernelError::Consensus(ConsensusError::NoEligibleNodes(ConsensusLevel::Quorum));
        assert!(!no_nodes.is_retryable());

        let commit = KernelError::CommitAtomicityFailure("partial".into());
        assert!(!commit.is_retryable());
    }
}
