//! The consensus coordinator: drives a proposal through one round.
//!
//! Vote requests fan out concurrently with a bounded timeout. A node
//! that does not answer in time abstains, but its weight stays in the
//! eligible denominator: silence can only hurt a proposal, never help
//! it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::error::ConsensusError;
use crate::node::{ConsensusLevel, ConsensusNode, NodeId, NodeRoster};
use crate::round::{Proposal, RoundPhase, RoundRecord, Tally, Vote, VoteDecision};
use crate::transport::ConsensusTransport;

/// Configuration for consensus rounds.
#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Commit threshold on yes-weight / eligible-weight.
    pub threshold: f64,
    /// How long to wait for any single node's vote.
    pub vote_timeout: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            threshold: 0.67,
            vote_timeout: Duration::from_secs(5),
        }
    }
}

/// Per-instance coordinator: roster, transport, and round history.
pub struct Coordinator<T> {
    roster: NodeRoster,
    transport: Arc<T>,
    config: ConsensusConfig,
    history: Vec<RoundRecord>,
}

impl<T: ConsensusTransport + 'static> Coordinator<T> {
    /// Create a coordinator with an empty roster.
    pub fn new(transport: T, config: ConsensusConfig) -> Self {
        Self {
            roster: NodeRoster::new(),
            transport: Arc::new(transport),
            config,
            history: Vec::new(),
        }
    }

    /// The node roster.
    pub fn roster(&self) -> &NodeRoster {
        &self.roster
    }

    /// Register a node (the agent layer's surface).
    pub fn register_node(&mut self, node: ConsensusNode) {
        self.roster.register(node);
    }

    /// Flip a node's active flag.
    pub fn set_node_active(&mut self, id: &NodeId, active: bool) -> bool {
        self.roster.set_active(id, active)
    }

    /// The transport, shared with in-flight vote requests.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Records of finished rounds, oldest first.
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    /// Drive one proposal through a full round.
    ///
    /// On commit the terminal record is returned; on rejection the
    /// record is still retained in history and `QuorumNotReached`
    /// reports the observed weights.
    pub async fn run_round(
        &mut self,
        proposal: Proposal,
        level: ConsensusLevel,
        now: i64,
    ) -> Result<&RoundRecord, ConsensusError> {
        let eligible: Vec<ConsensusNode> = self
            .roster
            .eligible(level)
            .into_iter()
            .cloned()
            .collect();
        if eligible.is_empty() {
            return Err(ConsensusError::NoEligibleNodes(level));
        }
        let eligible_weight: f64 = eligible.iter().map(|n| n.weight).sum();

        let mut record = RoundRecord {
            proposal,
            level,
            phase: RoundPhase::Proposed,
            votes: Vec::new(),
            tally: Tally {
                yes_weight: 0.0,
                eligible_weight,
                threshold: self.config.threshold,
            },
            decided_at: 0,
        };

        record.phase = RoundPhase::Voting;
        record.votes = self.collect_votes(&eligible, &record.proposal).await;
        record.tally = Tally::count(&record.votes, eligible_weight, self.config.threshold);
        record.decided_at = now;

        if record.tally.commits() {
            record.phase = RoundPhase::Committed;
            self.history.push(record);
            Ok(self.history.last().expect("round just recorded"))
        } else {
            tracing::debug!(
                "proposal rejected at level {}: yes {} of {}",
                level,
                record.tally.yes_weight,
                record.tally.eligible_weight
            );
            let tally = record.tally;
            record.phase = RoundPhase::Rejected;
            self.history.push(record);
            Err(ConsensusError::QuorumNotReached {
                yes_weight: tally.yes_weight,
                eligible_weight: tally.eligible_weight,
                threshold: tally.threshold,
            })
        }
    }

    /// Fan the vote requests out and gather weighted votes, in node-id
    /// order. Timeouts and transport failures become abstentions.
    async fn collect_votes(&self, eligible: &[ConsensusNode], proposal: &Proposal) -> Vec<Vote> {
        let mut join_set = JoinSet::new();
        for node in eligible.iter().cloned() {
            let transport = Arc::clone(&self.transport);
            let proposal = proposal.clone();
            let timeout = self.config.vote_timeout;
            join_set.spawn(async move {
                let decision =
                    match tokio::time::timeout(timeout, transport.request_vote(&node, &proposal))
                        .await
                    {
                        Ok(Ok(decision)) => decision,
                        Ok(Err(e)) => {
                            tracing::warn!("vote request to {} failed: {}", node.id, e);
                            VoteDecision::Abstain
                        }
                        // Timed out: abstains, weight stays eligible.
                        Err(_) => VoteDecision::Abstain,
                    };
                Vote {
                    node: node.id,
                    decision,
                    weight: node.weight,
                }
            });
        }

        let mut votes = Vec::with_capacity(eligible.len());
        while let Some(joined) = join_set.join_next().await {
            votes.push(joined.expect("vote task panicked"));
        }
        votes.sort_by_key(|v| v.node);
        votes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeRole;
    use crate::transport::memory::LocalTransport;
    use glyph_kernel_core::{Category, GlyphHash, GlyphKey};

    fn proposal() -> Proposal {
        Proposal {
            key: GlyphKey::from_bytes([7; 32]),
            category: Category::Action,
            data_hash: GlyphHash::from_bytes([7; 32]),
            complexity: 5,
        }
    }

    fn shard_topology(coordinator: &mut Coordinator<LocalTransport>) {
        coordinator.register_node(ConsensusNode::new(
            NodeId::from_bytes([0; 32]),
            NodeRole::Core,
            1.0,
        ));
        for n in 1..=4 {
            coordinator.register_node(ConsensusNode::new(
                NodeId::from_bytes([n; 32]),
                NodeRole::Shard,
                0.8,
            ));
        }
    }

    #[tokio::test]
    async fn test_all_yes_commits_at_shard_level() {
        let mut coordinator =
            Coordinator::new(LocalTransport::approving(), ConsensusConfig::default());
        shard_topology(&mut coordinator);

        let record = coordinator
            .run_round(proposal(), ConsensusLevel::Shard, 1000)
            .await
            .unwrap();

        assert_eq!(record.phase, RoundPhase::Committed);
        assert_eq!(record.votes.len(), 5);
        assert!((record.tally.eligible_weight - 4.2).abs() < 1e-9);
        assert!((record.tally.yes_weight - 4.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_roster_has_no_eligible_nodes() {
        let mut coordinator =
            Coordinator::new(LocalTransport::approving(), ConsensusConfig::default());

        let result = coordinator
            .run_round(proposal(), ConsensusLevel::Quorum, 1000)
            .await;
        assert_eq!(
            result.unwrap_err(),
            ConsensusError::NoEligibleNodes(ConsensusLevel::Quorum)
        );
        assert!(coordinator.history().is_empty());
    }

    #[tokio::test]
    async fn test_rejections_fail_quorum() {
        let transport = LocalTransport::approving();
        // Three of four shards reject: yes = 1.0 + 0.8 = 1.8 of 4.2.
        for n in 2..=4 {
            transport.script(NodeId::from_bytes([n; 32]), VoteDecision::Reject);
        }
        let mut coordinator = Coordinator::new(transport, ConsensusConfig::default());
        shard_topology(&mut coordinator);

        let result = coordinator
            .run_round(proposal(), ConsensusLevel::Shard, 1000)
            .await;

        match result.unwrap_err() {
            ConsensusError::QuorumNotReached {
                yes_weight,
                eligible_weight,
                ..
            } => {
                assert!((yes_weight - 1.8).abs() < 1e-9);
                assert!((eligible_weight - 4.2).abs() < 1e-9);
            }
            other => panic!("expected QuorumNotReached, got {other:?}"),
        }

        // The rejected round is still in history, terminal.
        assert_eq!(coordinator.history().len(), 1);
        assert_eq!(coordinator.history()[0].phase, RoundPhase::Rejected);
    }

    #[tokio::test]
    async fn test_silent_node_abstains_but_keeps_weight() {
        let transport = LocalTransport::approving();
        transport.silence(NodeId::from_bytes([1; 32]));
        let config = ConsensusConfig {
            threshold: 0.67,
            vote_timeout: Duration::from_millis(20),
        };
        let mut coordinator = Coordinator::new(transport, config);
        shard_topology(&mut coordinator);

        // yes = 4.2 - 0.8 = 3.4; ratio 3.4 / 4.2 ≈ 0.81 still commits.
        let record = coordinator
            .run_round(proposal(), ConsensusLevel::Shard, 1000)
            .await
            .unwrap();

        assert_eq!(record.phase, RoundPhase::Committed);
        assert!((record.tally.eligible_weight - 4.2).abs() < 1e-9);
        assert!((record.tally.yes_weight - 3.4).abs() < 1e-9);

        let abstained = record
            .votes
            .iter()
            .find(|v| v.node == NodeId::from_bytes([1; 32]))
            .unwrap();
        assert_eq!(abstained.decision, VoteDecision::Abstain);
    }

    #[tokio::test]
    async fn test_exact_threshold_boundary_commits() {
        let transport = LocalTransport::approving();
        transport.script(NodeId::from_bytes([2; 32]), VoteDecision::Reject);
        let config = ConsensusConfig {
            threshold: 0.5,
            vote_timeout: Duration::from_secs(1),
        };
        let mut coordinator = Coordinator::new(transport, config);
        coordinator.register_node(ConsensusNode::new(
            NodeId::from_bytes([1; 32]),
            NodeRole::Core,
            1.0,
        ));
        coordinator.register_node(ConsensusNode::new(
            NodeId::from_bytes([2; 32]),
            NodeRole::Shard,
            1.0,
        ));

        // Exactly 1.0 of 2.0 at threshold 0.5.
        let record = coordinator
            .run_round(proposal(), ConsensusLevel::Shard, 1000)
            .await
            .unwrap();
        assert_eq!(record.phase, RoundPhase::Committed);
    }

    #[tokio::test]
    async fn test_votes_recorded_in_node_order() {
        let mut coordinator =
            Coordinator::new(LocalTransport::approving(), ConsensusConfig::default());
        shard_topology(&mut coordinator);

        let record = coordinator
            .run_round(proposal(), ConsensusLevel::Quorum, 1000)
            .await
            .unwrap();

        let ids: Vec<NodeId> = record.votes.iter().map(|v| v.node).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
