//! Error types for the consensus crate.

use thiserror::Error;

use crate::node::ConsensusLevel;

/// Errors from consensus rounds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsensusError {
    /// The level resolved to an empty eligible set.
    #[error("no eligible nodes for consensus level {0}")]
    NoEligibleNodes(ConsensusLevel),

    /// The yes-weight ratio fell short of the threshold.
    ///
    /// Transient: retryable with backoff once voters change their state.
    #[error(
        "quorum not reached: yes weight {yes_weight} of {eligible_weight} eligible \
         (threshold {threshold})"
    )]
    QuorumNotReached {
        yes_weight: f64,
        eligible_weight: f64,
        threshold: f64,
    },

    /// The transport failed outright (distinct from a single node not
    /// responding, which is an abstention).
    #[error("consensus transport error: {0}")]
    Transport(String),
}
