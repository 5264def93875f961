//! Transport abstraction for vote collection.
//!
//! The coordinator fans vote requests out through this trait.
//! Implementations may cross a network; the in-process [`memory`]
//! transport is the deterministic default used in tests and
//! single-process deployments.

use async_trait::async_trait;

use crate::error::ConsensusError;
use crate::node::ConsensusNode;
use crate::round::{Proposal, VoteDecision};

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Asks one node for its vote on a proposal.
///
/// Implementations must be thread-safe (Send + Sync). A request that
/// never resolves is handled by the coordinator's bounded timeout and
/// counted as an abstention.
#[async_trait]
pub trait ConsensusTransport: Send + Sync {
    /// Request a vote from a specific node.
    async fn request_vote(
        &self,
        node: &ConsensusNode,
        proposal: &Proposal,
    ) -> Result<VoteDecision>;
}

/// A deterministic in-process transport.
///
/// Decisions are scripted per node; unscripted nodes answer with the
/// default decision. Silenced nodes never answer, exercising the
/// coordinator's timeout path.
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::RwLock;

    use crate::node::NodeId;

    /// In-process transport with scripted votes.
    pub struct LocalTransport {
        default_decision: VoteDecision,
        scripted: RwLock<HashMap<NodeId, VoteDecision>>,
        silent: RwLock<HashSet<NodeId>>,
    }

    impl LocalTransport {
        /// Every node approves unless scripted otherwise.
        pub fn approving() -> Self {
            Self::with_default(VoteDecision::Approve)
        }

        /// Every node answers `default` unless scripted otherwise.
        pub fn with_default(default: VoteDecision) -> Self {
            Self {
                default_decision: default,
                scripted: RwLock::new(HashMap::new()),
                silent: RwLock::new(HashSet::new()),
            }
        }

        /// Script a specific node's decision.
        pub fn script(&self, node: NodeId, decision: VoteDecision) {
            self.scripted.write().unwrap().insert(node, decision);
        }

        /// Make a node stop answering vote requests.
        pub fn silence(&self, node: NodeId) {
            self.silent.write().unwrap().insert(node);
        }
    }

    impl Default for LocalTransport {
        fn default() -> Self {
            Self::approving()
        }
    }

    #[async_trait]
    impl ConsensusTransport for LocalTransport {
        async fn request_vote(
            &self,
            node: &ConsensusNode,
            _proposal: &Proposal,
        ) -> Result<VoteDecision> {
            if self.silent.read().unwrap().contains(&node.id) {
                // Never resolves; the coordinator's timeout converts
                // this into an abstention.
                std::future::pending::<()>().await;
                unreachable!("pending future resolved");
            }

            let decision = self
                .scripted
                .read()
                .unwrap()
                .get(&node.id)
                .copied()
                .unwrap_or(self.default_decision);
            Ok(decision)
        }
    }
}
