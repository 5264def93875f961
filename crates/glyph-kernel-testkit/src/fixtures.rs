//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a seeded system with a
//! known symbol set and a scripted consensus topology.

use glyph_kernel::{
    CompositeSymbol, CompositionKind, ConsensusNode, GlyphSystem, GlyphSystemConfig, NodeId,
    NodeRole, SymbolValue, WriterId,
};

/// A test fixture wrapping a [`GlyphSystem`] with the default in-process
/// transport.
pub struct TestFixture {
    pub system: GlyphSystem,
}

impl TestFixture {
    /// Create a fixture with a random writer identity.
    pub fn new() -> Self {
        Self {
            system: GlyphSystem::default(),
        }
    }

    /// Create with a stable writer derived from a name, so lineage
    /// entry ids reproduce across runs.
    pub fn with_writer(name: &str) -> Self {
        let config = GlyphSystemConfig {
            writer: WriterId::derive(name),
            ..GlyphSystemConfig::default()
        };
        Self {
            system: GlyphSystem::new(config),
        }
    }

    /// Register the standard ten-symbol set: five control atoms
    /// (complexities 1, 1, 3, 6, 6) and five action atoms
    /// (2, 1, 6, 2, 1).
    pub fn seed_symbols(&self) {
        let control = [(0x010u32, 1u32), (0x011, 1), (0x012, 3), (0x013, 6), (0x014, 6)];
        let action = [(0x1000u32, 2u32), (0x1001, 1), (0x1002, 6), (0x1003, 2), (0x1004, 1)];

        for (i, (value, complexity)) in control.into_iter().enumerate() {
            self.system
                .register_atomic(SymbolValue(value), format!("ctl-{i}"), complexity)
                .expect("seed symbol registers");
        }
        for (i, (value, complexity)) in action.into_iter().enumerate() {
            self.system
                .register_atomic(SymbolValue(value), format!("act-{i}"), complexity)
                .expect("seed symbol registers");
        }
    }

    /// Register a single approving core node, enough for `Local` rounds.
    pub async fn seed_core_node(&self) {
        self.system
            .register_node(ConsensusNode::new(
                NodeId::from_bytes([0; 32]),
                NodeRole::Core,
                1.0,
            ))
            .await;
    }

    /// Register the 1 x core (1.0) + 4 x shard (0.8) topology: 4.2
    /// eligible weight at the shard level.
    pub async fn seed_shard_topology(&self) {
        self.seed_core_node().await;
        for n in 1..=4u8 {
            self.system
                .register_node(ConsensusNode::new(
                    NodeId::from_bytes([n; 32]),
                    NodeRole::Shard,
                    0.8,
                ))
                .await;
        }
    }

    /// Compose the low-complexity control triple under a kind.
    pub fn compose_control(&self, kind: CompositionKind) -> CompositeSymbol {
        self.system
            .compose_meta(
                [SymbolValue(0x010), SymbolValue(0x011), SymbolValue(0x012)],
                kind,
            )
            .expect("seeded control triple composes")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple fixtures with distinct stable writers, for
/// multi-writer lineage tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| TestFixture::with_writer(&format!("party-{i}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_kernel::{Category, ConsensusLevel};

    #[tokio::test]
    async fn test_fixture_admits() {
        let fixture = TestFixture::new();
        fixture.seed_symbols();
        fixture.seed_core_node().await;

        let composite = fixture.compose_control(CompositionKind::Sequential);
        let receipt = fixture
            .system
            .admit(&composite.key, ConsensusLevel::Local)
            .await
            .unwrap();
        assert_eq!(receipt.category, Category::Control);
    }

    #[tokio::test]
    async fn test_shard_topology_weight() {
        let fixture = TestFixture::new();
        fixture.seed_symbols();
        fixture.seed_shard_topology().await;

        let composite = fixture.compose_control(CompositionKind::Sequential);
        fixture
            .system
            .admit(&composite.key, ConsensusLevel::Shard)
            .await
            .unwrap();

        let history = fixture.system.round_history().await;
        assert!((history[0].tally.eligible_weight - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_multi_party_writers_distinct() {
        let fixtures = multi_party_fixtures(3);
        let writers: Vec<_> = fixtures.iter().map(|f| f.system.writer()).collect();
        assert_ne!(writers[0], writers[1]);
        assert_ne!(writers[1], writers[2]);

        // Stable across invocations.
        let again = multi_party_fixtures(3);
        assert_eq!(writers[0], again[0].system.writer());
    }
}
