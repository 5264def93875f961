//! Node roster: the participants of consensus rounds.
//!
//! Nodes are registered by the agent layer with a role and weight. A
//! consensus level resolves to a fixed role subset; only active nodes in
//! that subset are eligible to vote.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unique identifier for a consensus node.
///
/// Serializes as a hex string, like every 32-byte identifier the kernel
/// exposes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a random node ID.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::thread_rng().gen())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Role a node plays in the consensus topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// The coordinating core.
    Core,
    /// A shard replica.
    Shard,
    /// An independent validator.
    Validator,
}

/// The role subsets a round may be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsensusLevel {
    /// Core node only.
    Local,
    /// Core and shard roles.
    Shard,
    /// Core and validator roles.
    Global,
    /// Every active node, regardless of role.
    Quorum,
}

impl ConsensusLevel {
    /// Whether a role belongs to this level's subset.
    pub fn admits_role(&self, role: NodeRole) -> bool {
        match self {
            ConsensusLevel::Local => matches!(role, NodeRole::Core),
            ConsensusLevel::Shard => matches!(role, NodeRole::Core | NodeRole::Shard),
            ConsensusLevel::Global => matches!(role, NodeRole::Core | NodeRole::Validator),
            ConsensusLevel::Quorum => true,
        }
    }
}

impl fmt::Display for ConsensusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsensusLevel::Local => "local",
            ConsensusLevel::Shard => "shard",
            ConsensusLevel::Global => "global",
            ConsensusLevel::Quorum => "quorum",
        };
        f.write_str(name)
    }
}

/// A registered consensus participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusNode {
    pub id: NodeId,
    pub role: NodeRole,
    /// Voting weight. Counts toward the eligible denominator whether or
    /// not the node responds.
    pub weight: f64,
    pub active: bool,
}

impl ConsensusNode {
    /// A new active node.
    pub fn new(id: NodeId, role: NodeRole, weight: f64) -> Self {
        Self {
            id,
            role,
            weight,
            active: true,
        }
    }
}

/// The set of registered nodes, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeRoster {
    nodes: BTreeMap<NodeId, ConsensusNode>,
}

impl NodeRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Re-registering an id replaces its role, weight,
    /// and active flag.
    pub fn register(&mut self, node: ConsensusNode) {
        self.nodes.insert(node.id, node);
    }

    /// Flip a node's active flag. Returns false if the id is unknown.
    pub fn set_active(&mut self, id: &NodeId, active: bool) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.active = active;
                true
            }
            None => false,
        }
    }

    /// Look up a node.
    pub fn get(&self, id: &NodeId) -> Option<&ConsensusNode> {
        self.nodes.get(id)
    }

    /// All nodes, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ConsensusNode> {
        self.nodes.values()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Active nodes admitted by a level, in id order.
    pub fn eligible(&self, level: ConsensusLevel) -> Vec<&ConsensusNode> {
        self.nodes
            .values()
            .filter(|n| n.active && level.admits_role(n.role))
            .collect()
    }

    /// Combined weight of the eligible set.
    pub fn eligible_weight(&self, level: ConsensusLevel) -> f64 {
        self.eligible(level).iter().map(|n| n.weight).sum()
    }
}
