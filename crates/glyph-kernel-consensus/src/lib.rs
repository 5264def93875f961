//! # Glyph Kernel Consensus
//!
//! The quorum-weighted admission gate: node roster with roles and
//! weights, consensus levels resolving role subsets, and the per-proposal
//! round state machine.
//!
//! Voting is transport-agnostic. [`ConsensusTransport`] is the seam; the
//! in-process [`transport::memory::LocalTransport`] is the deterministic
//! default, and a networked backend plugs in without changing any of the
//! checkable arithmetic (weights, thresholds, tallies).

pub mod coordinator;
pub mod error;
pub mod node;
pub mod round;
pub mod transport;

pub use coordinator::{ConsensusConfig, Coordinator};
pub use error::ConsensusError;
pub use node::{ConsensusLevel, ConsensusNode, NodeId, NodeRole, NodeRoster};
pub use round::{Proposal, RoundPhase, RoundRecord, Tally, Vote, VoteDecision};
pub use transport::ConsensusTransport;
