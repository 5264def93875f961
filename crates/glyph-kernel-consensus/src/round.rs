//! Round state and tally arithmetic.
//!
//! A round takes a proposal through `Proposed → Voting → {Committed |
//! Rejected}`. The terminal phases are final; a rejected proposal may be
//! resubmitted as a fresh round after backoff.

use serde::{Deserialize, Serialize};

use glyph_kernel_core::{Category, GlyphHash, GlyphKey};

use crate::node::{ConsensusLevel, NodeId};

/// What the eligible nodes vote on: the identity of a candidate ledger
/// admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Content key of the glyph seeking admission.
    pub key: GlyphKey,
    /// Ledger category the leaf would be inserted into.
    pub category: Category,
    /// The leaf hash that would enter the Merkle tree.
    pub data_hash: GlyphHash,
    /// Complexity of the proposed glyph, for voter heuristics.
    pub complexity: u32,
}

/// A node's answer to a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteDecision {
    Approve,
    Reject,
    /// No position. Also recorded for nodes that time out or error; the
    /// node's weight stays in the eligible denominator.
    Abstain,
}

/// A weighted vote as counted by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub node: NodeId,
    pub decision: VoteDecision,
    pub weight: f64,
}

/// Phase of the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Proposed,
    Voting,
    /// Terminal: quorum reached, ledger write triggered.
    Committed,
    /// Terminal: quorum not reached.
    Rejected,
}

impl RoundPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundPhase::Committed | RoundPhase::Rejected)
    }
}

/// The weighted outcome of a vote collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub yes_weight: f64,
    pub eligible_weight: f64,
    pub threshold: f64,
}

impl Tally {
    /// Compute the tally for a vote set against an eligible weight.
    pub fn count(votes: &[Vote], eligible_weight: f64, threshold: f64) -> Self {
        let yes_weight = votes
            .iter()
            .filter(|v| v.decision == VoteDecision::Approve)
            .map(|v| v.weight)
            .sum();
        Self {
            yes_weight,
            eligible_weight,
            threshold,
        }
    }

    /// The commit rule: yes-weight over eligible weight meets the
    /// threshold. The boundary (exact equality) commits.
    pub fn commits(&self) -> bool {
        self.eligible_weight > 0.0 && self.yes_weight / self.eligible_weight >= self.threshold
    }
}

/// The retained record of a finished round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub proposal: Proposal,
    pub level: ConsensusLevel,
    pub phase: RoundPhase,
    /// Votes in node-id order, including recorded abstentions.
    pub votes: Vec<Vote>,
    pub tally: Tally,
    /// When the round reached its terminal phase (Unix milliseconds).
    pub decided_at: i64,
}
