//! Export / import: the only persisted format this kernel defines.
//!
//! The document carries everything an equivalent instance needs:
//! symbols, retained compositions, per-category leaves and roots, the
//! lineage log, and the entropy budget. On import the trees are rebuilt
//! from the leaves and the recomputed roots are checked against the
//! document, so a corrupted or hand-edited document is rejected rather
//! than silently trusted.
//!
//! The node roster is deliberately not exported: participants are
//! registered by the agent layer, and voter weights are admission
//! policy, not ledger data.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use glyph_kernel_consensus::transport::memory::LocalTransport;
use glyph_kernel_consensus::{ConsensusConfig, ConsensusTransport};
use glyph_kernel_core::{
    AggregateSymbol, AtomicSymbol, Category, CategoryRange, CategoryTable, ComposerConfig,
    CompositeSymbol, CompositionProtocol, GlyphHash, GlyphKey, ProtocolTable, WriterId,
};
use glyph_kernel_ledger::{LedgerError, LineageEntry, DEFAULT_BATCH_LIMIT};

use crate::error::Result;
use crate::governor::GovernorConfig;
use crate::system::{GlyphSystem, GlyphSystemConfig};

/// Current export document schema version.
pub const EXPORT_VERSION: u8 = 0;

/// The persisted snapshot of a GlyphSystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Schema version.
    pub version: u8,
    /// The exporting instance's lineage writer.
    pub writer: WriterId,
    /// Category range table rows.
    pub categories: Vec<CategoryRange>,
    /// Composition protocols, in table order.
    pub protocols: Vec<CompositionProtocol>,
    /// Atomic symbols, in value order.
    pub symbols: Vec<AtomicSymbol>,
    /// Retained composites, in key order.
    pub composites: Vec<CompositeSymbol>,
    /// Retained aggregates, in key order.
    pub aggregates: Vec<AggregateSymbol>,
    /// Current root per non-empty category tree.
    pub ledger_roots: BTreeMap<Category, GlyphHash>,
    /// Sorted leaves per non-empty category tree.
    pub ledger_leaves: BTreeMap<Category, Vec<GlyphHash>>,
    /// Lineage entries, in append order.
    pub lineage: Vec<LineageEntry>,
    /// Remaining entropy budget.
    pub entropy_budget: f64,
}

impl ExportDocument {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write as JSON to a file.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a JSON document from a file.
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl<T: ConsensusTransport + 'static> GlyphSystem<T> {
    /// Snapshot this instance into an export document.
    pub fn export(&self) -> ExportDocument {
        let registry = self.registry.read().unwrap();
        let forest = self.forest.read().unwrap();
        let lineage = self.lineage.read().unwrap();
        let governor = self.governor.lock().unwrap();

        let mut ledger_leaves = BTreeMap::new();
        for category in Category::ALL {
            if let Some(tree) = forest.tree(category) {
                if !tree.is_empty() {
                    ledger_leaves.insert(category, tree.leaves().copied().collect());
                }
            }
        }

        ExportDocument {
            version: EXPORT_VERSION,
            writer: lineage.writer(),
            categories: registry.category_table().ranges().to_vec(),
            protocols: self.protocols.iter().cloned().collect(),
            symbols: registry.atomics().cloned().collect(),
            composites: registry.composites().cloned().collect(),
            aggregates: registry.aggregates().cloned().collect(),
            ledger_roots: forest.roots(),
            ledger_leaves,
            lineage: lineage.entries().to_vec(),
            entropy_budget: governor.budget(),
        }
    }

    /// Write a snapshot to a JSON file.
    pub fn export_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        self.export().write_to_path(path)
    }

    /// Reconstruct an equivalent instance over a custom transport.
    ///
    /// Registration and composition records are replayed through the
    /// normal validation paths; the rebuilt roots are checked against
    /// the document (`RootMismatch` on disagreement).
    pub fn import_with_transport(
        document: &ExportDocument,
        transport: T,
        consensus: ConsensusConfig,
    ) -> Result<Self> {
        let categories = CategoryTable::new(document.categories.clone())?;
        let mut protocols = ProtocolTable::new();
        for protocol in &document.protocols {
            protocols.insert(protocol.clone());
        }

        let config = GlyphSystemConfig {
            categories,
            protocols,
            composer: ComposerConfig::default(),
            governor: GovernorConfig::default(),
            consensus,
            batch_limit: DEFAULT_BATCH_LIMIT,
            writer: document.writer,
        };
        let system = Self::with_transport(config, transport);

        {
            let mut registry = system.registry.write().unwrap();
            for symbol in &document.symbols {
                registry.register_with_deps(
                    symbol.value,
                    symbol.meaning.clone(),
                    symbol.complexity,
                    symbol.dependencies.clone(),
                )?;
            }
            for composite in &document.composites {
                registry.insert_composite(composite.clone());
            }
            for aggregate in &document.aggregates {
                registry.insert_aggregate(aggregate.clone());
            }
        }

        {
            let mut forest = system.forest.write().unwrap();
            for (category, leaves) in &document.ledger_leaves {
                for leaf in leaves {
                    forest.insert(*category, *leaf);
                }
            }
            for (category, expected) in &document.ledger_roots {
                let computed = forest.root(*category);
                if computed != Some(*expected) {
                    return Err(LedgerError::RootMismatch {
                        category: *category,
                        expected: *expected,
                        computed: computed.unwrap_or(GlyphHash::ZERO),
                    }
                    .into());
                }
            }
        }

        {
            let mut lineage = system.lineage.write().unwrap();
            let mut admitted = system.admitted.write().unwrap();
            for entry in &document.lineage {
                lineage.integrate(entry.clone())?;
                admitted.insert(GlyphKey(entry.data_hash.0), entry.id);
            }
        }

        system
            .governor
            .lock()
            .unwrap()
            .set_budget(document.entropy_budget);

        Ok(system)
    }
}

impl GlyphSystem<LocalTransport> {
    /// Reconstruct an equivalent instance with the default in-process
    /// transport and consensus config.
    pub fn import(document: &ExportDocument) -> Result<Self> {
        Self::import_with_transport(
            document,
            LocalTransport::approving(),
            ConsensusConfig::default(),
        )
    }

    /// Read a JSON snapshot and reconstruct an instance from it.
    pub fn import_from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::import(&ExportDocument::read_from_path(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_kernel_consensus::{ConsensusLevel, ConsensusNode, NodeId, NodeRole};
    use glyph_kernel_core::{CompositionKind, SymbolValue};

    async fn populated_system() -> GlyphSystem {
        let system = GlyphSystem::default();
        system
            .register_node(ConsensusNode::new(
                NodeId::from_bytes([0; 32]),
                NodeRole::Core,
                1.0,
            ))
            .await;

        system
            .register_atomic(SymbolValue(0x01), "init", 1)
            .unwrap();
        system
            .register_atomic(SymbolValue(0x02), "scan", 2)
            .unwrap();
        system
            .register_atomic(SymbolValue(0x00_1000), "transform", 3)
            .unwrap();

        let c1 = system
            .compose_meta(
                [SymbolValue(0x01), SymbolValue(0x02), SymbolValue(0x00_1000)],
                CompositionKind::Sequential,
            )
            .unwrap();
        let c2 = system
            .compose_meta(
                [SymbolValue(0x00_1000), SymbolValue(0x02), SymbolValue(0x01)],
                CompositionKind::Pipeline,
            )
            .unwrap();

        system.admit(&c1.key, ConsensusLevel::Local).await.unwrap();
        system.admit(&c2.key, ConsensusLevel::Local).await.unwrap();
        system
    }

    #[tokio::test]
    async fn test_roundtrip_preserves_roots_and_registry() {
        let original = populated_system().await;
        let document = original.export();

        let restored = GlyphSystem::import(&document).unwrap();

        assert_eq!(original.ledger_roots(), restored.ledger_roots());
        assert_eq!(
            original.atomic(SymbolValue(0x01)),
            restored.atomic(SymbolValue(0x01))
        );
        assert_eq!(original.lineage_entries(), restored.lineage_entries());
        assert!((original.entropy_budget() - restored.entropy_budget()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_roundtrip_through_json() {
        let original = populated_system().await;
        let json = original.export().to_json().unwrap();

        let document = ExportDocument::from_json(&json).unwrap();
        let restored = GlyphSystem::import(&document).unwrap();

        assert_eq!(original.ledger_roots(), restored.ledger_roots());
    }

    #[tokio::test]
    async fn test_imported_tree_still_proves() {
        let original = populated_system().await;
        let document = original.export();
        let restored = GlyphSystem::import(&document).unwrap();

        let (category, leaves) = document.ledger_leaves.iter().next().unwrap();
        let leaf = leaves[0];
        let root = restored.root(*category).unwrap();

        let proof = restored.prove(*category, &leaf).unwrap();
        assert!(proof.verify(&root));
    }

    #[tokio::test]
    async fn test_tampered_document_rejected() {
        let original = populated_system().await;
        let mut document = original.export();

        let (category, leaves) = document.ledger_leaves.iter_mut().next().unwrap();
        leaves.push(GlyphHash::hash(b"forged leaf"));
        let category = *category;

        let err = GlyphSystem::import(&document).unwrap_err();
        assert!(matches!(
            err,
            crate::error::KernelError::Ledger(LedgerError::RootMismatch { category: c, .. })
                if c == category
        ));
    }

    #[tokio::test]
    async fn test_file_roundtrip() {
        let original = populated_system().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glyphs.json");

        original.export_to_path(&path).unwrap();
        let restored = GlyphSystem::import_from_path(&path).unwrap();

        assert_eq!(original.ledger_roots(), restored.ledger_roots());
    }

    #[tokio::test]
    async fn test_import_continues_writing() {
        let original = populated_system().await;
        let document = original.export();
        let restored = GlyphSystem::import(&document).unwrap();
        restored
            .register_node(ConsensusNode::new(
                NodeId::from_bytes([0; 32]),
                NodeRole::Core,
                1.0,
            ))
            .await;

        // A fresh composition admits cleanly on the restored instance.
        let c3 = restored
            .compose_meta(
                [SymbolValue(0x02), SymbolValue(0x01), SymbolValue(0x00_1000)],
                CompositionKind::Sequential,
            )
            .unwrap();
        let receipt = restored
            .admit(&c3.key, ConsensusLevel::Local)
            .await
            .unwrap();

        // The new entry's clock descends every imported entry's clock.
        for entry in document.lineage {
            assert!(receipt.entry.clock.descends(&entry.clock));
        }
    }
}
