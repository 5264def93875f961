//! The GlyphSystem: unified API for the Glyph Kernel.
//!
//! One explicit instance owns the registry, protocol table, Merkle
//! forest, lineage log, consensus coordinator, and entropy governor.
//! Nothing lives in module-level globals, so independent instances
//! coexist in the same process.
//!
//! The admission transaction (budget gate → consensus vote → Merkle
//! insert + lineage append) runs as one critical section per category.
//! Everything after the consensus await is synchronous, so cancelling an
//! in-flight `admit` before the ledger insert leaves no observable side
//! effect.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use glyph_kernel_consensus::transport::memory::LocalTransport;
use glyph_kernel_consensus::{
    ConsensusConfig, ConsensusLevel, ConsensusNode, ConsensusTransport, Coordinator, NodeId,
    Proposal, RoundRecord,
};
use glyph_kernel_core::composer::{compose_meta, compose_ultra};
use glyph_kernel_core::{
    AggregateSymbol, AtomicSymbol, Category, CategoryTable, ComposerConfig, CompositeSymbol,
    CompositionKind, GlyphHash, GlyphKey, ProgramType, ProtocolTable, SymbolRegistry,
    SymbolValue, WriterId,
};
use glyph_kernel_ledger::{
    Attestation, BatchAttestor, EntryId, LineageEntry, LineageLog, LineageOp, MerkleForest,
    MerkleProof, DEFAULT_BATCH_LIMIT,
};

use crate::error::{KernelError, Result};
use crate::governor::{EntropyGovernor, GovernorConfig};

/// Configuration for a GlyphSystem instance.
#[derive(Debug, Clone)]
pub struct GlyphSystemConfig {
    /// Category range table.
    pub categories: CategoryTable,
    /// Composition protocols.
    pub protocols: ProtocolTable,
    /// Composer tunables.
    pub composer: ComposerConfig,
    /// Entropy budget tunables.
    pub governor: GovernorConfig,
    /// Consensus tunables.
    pub consensus: ConsensusConfig,
    /// Cap on leaves per batch attestation.
    pub batch_limit: usize,
    /// Lineage writer identity of this instance.
    pub writer: WriterId,
}

impl Default for GlyphSystemConfig {
    fn default() -> Self {
        Self {
            categories: CategoryTable::standard(),
            protocols: ProtocolTable::standard(),
            composer: ComposerConfig::default(),
            governor: GovernorConfig::default(),
            consensus: ConsensusConfig::default(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            writer: WriterId::random(),
        }
    }
}

/// What a successful admission hands back to the caller.
#[derive(Debug, Clone)]
pub struct AdmissionReceipt {
    /// The admitted glyph.
    pub key: GlyphKey,
    /// The ledger category its leaf entered.
    pub category: Category,
    /// The category root after the insert.
    pub root: GlyphHash,
    /// The committed lineage entry.
    pub entry: LineageEntry,
}

/// The main kernel struct.
///
/// Generic over the consensus transport; the in-process
/// [`LocalTransport`] is the default.
pub struct GlyphSystem<T = LocalTransport> {
    pub(crate) registry: RwLock<SymbolRegistry>,
    pub(crate) protocols: ProtocolTable,
    pub(crate) composer: ComposerConfig,
    pub(crate) forest: RwLock<MerkleForest>,
    pub(crate) lineage: RwLock<LineageLog>,
    /// Latest lineage entry per admitted glyph, for causal wiring.
    pub(crate) admitted: RwLock<BTreeMap<GlyphKey, EntryId>>,
    pub(crate) governor: Mutex<EntropyGovernor>,
    pub(crate) coordinator: tokio::sync::Mutex<Coordinator<T>>,
    pub(crate) attestor: BatchAttestor,
    admission_locks: Mutex<HashMap<Category, Arc<tokio::sync::Mutex<()>>>>,
}

impl<T> std::fmt::Debug for GlyphSystem<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphSystem").finish_non_exhaustive()
    }
}

impl GlyphSystem<LocalTransport> {
    /// Create a system with the deterministic in-process transport
    /// (every registered node approves unless scripted otherwise).
    pub fn new(config: GlyphSystemConfig) -> Self {
        Self::with_transport(config, LocalTransport::approving())
    }
}

impl Default for GlyphSystem<LocalTransport> {
    fn default() -> Self {
        Self::new(GlyphSystemConfig::default())
    }
}

impl<T: ConsensusTransport + 'static> GlyphSystem<T> {
    /// Create a system over a custom consensus transport.
    pub fn with_transport(config: GlyphSystemConfig, transport: T) -> Self {
        Self {
            registry: RwLock::new(SymbolRegistry::new(config.categories)),
            protocols: config.protocols,
            composer: config.composer,
            forest: RwLock::new(MerkleForest::new()),
            lineage: RwLock::new(LineageLog::new(config.writer)),
            admitted: RwLock::new(BTreeMap::new()),
            governor: Mutex::new(EntropyGovernor::new(config.governor)),
            coordinator: tokio::sync::Mutex::new(Coordinator::new(transport, config.consensus)),
            attestor: BatchAttestor::with_backend(Default::default(), config.batch_limit),
            admission_locks: Mutex::new(HashMap::new()),
        }
    }

    /// This instance's lineage writer identity.
    pub fn writer(&self) -> WriterId {
        self.lineage.read().unwrap().writer()
    }

    /// The protocol table in use.
    pub fn protocols(&self) -> &ProtocolTable {
        &self.protocols
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registry Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Register an atomic symbol.
    pub fn register_atomic(
        &self,
        value: SymbolValue,
        meaning: impl Into<String>,
        complexity: u32,
    ) -> Result<AtomicSymbol> {
        let mut registry = self.registry.write().unwrap();
        Ok(registry.register(value, meaning, complexity)?.clone())
    }

    /// Register an atomic symbol with declared dependencies.
    pub fn register_atomic_with_deps(
        &self,
        value: SymbolValue,
        meaning: impl Into<String>,
        complexity: u32,
        dependencies: Vec<SymbolValue>,
    ) -> Result<AtomicSymbol> {
        let mut registry = self.registry.write().unwrap();
        Ok(registry
            .register_with_deps(value, meaning, complexity, dependencies)?
            .clone())
    }

    /// Look up an atomic symbol.
    pub fn atomic(&self, value: SymbolValue) -> Option<AtomicSymbol> {
        self.registry.read().unwrap().lookup(value).cloned()
    }

    /// Compose and retain a composite from 3 registered atomics.
    pub fn compose_meta(
        &self,
        members: [SymbolValue; 3],
        kind: CompositionKind,
    ) -> Result<CompositeSymbol> {
        let mut registry = self.registry.write().unwrap();
        let composite = compose_meta(&registry, &self.protocols, members, kind)?;
        Ok(registry.insert_composite(composite).clone())
    }

    /// Compose and retain an aggregate from 3 retained composites.
    pub fn compose_ultra(
        &self,
        members: [GlyphKey; 3],
        program_type: ProgramType,
    ) -> Result<AggregateSymbol> {
        let mut registry = self.registry.write().unwrap();
        let aggregate = compose_ultra(&registry, members, program_type, &self.composer)?;
        Ok(registry.insert_aggregate(aggregate).clone())
    }

    /// Look up a retained composite.
    pub fn composite(&self, key: &GlyphKey) -> Option<CompositeSymbol> {
        self.registry.read().unwrap().composite(key).cloned()
    }

    /// Look up a retained aggregate.
    pub fn aggregate(&self, key: &GlyphKey) -> Option<AggregateSymbol> {
        self.registry.read().unwrap().aggregate(key).cloned()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Node Operations (the agent layer's surface)
    // ─────────────────────────────────────────────────────────────────────

    /// Register a consensus participant.
    pub async fn register_node(&self, node: ConsensusNode) {
        self.coordinator.lock().await.register_node(node);
    }

    /// Flip a node's active flag. Returns false if the id is unknown.
    pub async fn set_node_active(&self, id: &NodeId, active: bool) -> bool {
        self.coordinator.lock().await.set_node_active(id, active)
    }

    /// Records of finished consensus rounds, oldest first.
    pub async fn round_history(&self) -> Vec<RoundRecord> {
        self.coordinator.lock().await.history().to_vec()
    }

    /// The consensus transport, shared with in-flight vote requests.
    pub async fn transport(&self) -> Arc<T> {
        Arc::clone(self.coordinator.lock().await.transport())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Admission
    // ─────────────────────────────────────────────────────────────────────

    /// Run the full admission transaction for a composed glyph.
    ///
    /// Budget gate, consensus round at `level`, then the Merkle insert +
    /// lineage append pair. Re-admitting an already-admitted key is
    /// permitted: the leaf set dedups, the lineage records the repeat.
    pub async fn admit(&self, key: &GlyphKey, level: ConsensusLevel) -> Result<AdmissionReceipt> {
        let (category, complexity, op, deps) = self.resolve_admission(key)?;

        let lock = self.category_lock(category);
        let _guard = lock.lock().await;

        // Budget gate: refuse before burning a consensus round. The
        // commit step re-validates under the same category lock.
        {
            let governor = self.governor.lock().unwrap();
            if !governor.can_admit(complexity) {
                return Err(KernelError::InsufficientBudget {
                    cost: governor.cost(complexity),
                    remaining: governor.budget(),
                });
            }
        }

        let proposal = Proposal {
            key: *key,
            category,
            data_hash: GlyphHash(key.0),
            complexity,
        };
        {
            let mut coordinator = self.coordinator.lock().await;
            coordinator.run_round(proposal, level, now_millis()).await?;
        }

        // No awaits past this point: the paired commit runs to
        // completion once entered.
        self.commit_admission(*key, category, complexity, op, deps)
    }

    /// Resolve the glyph behind a key into its admission parameters.
    fn resolve_admission(
        &self,
        key: &GlyphKey,
    ) -> Result<(Category, u32, LineageOp, Vec<EntryId>)> {
        let registry = self.registry.read().unwrap();

        if let Some(composite) = registry.composite(key) {
            let lead = registry.resolve(composite.lead_member())?;
            return Ok((
                lead.category,
                composite.complexity,
                LineageOp::AdmitMeta,
                Vec::new(),
            ));
        }

        if let Some(aggregate) = registry.aggregate(key) {
            let lead_composite = registry.resolve_composite(&aggregate.lead_member())?;
            let lead_atom = registry.resolve(lead_composite.lead_member())?;

            // Causal wiring: member composites that were themselves
            // admitted become dependencies of this entry.
            let admitted = self.admitted.read().unwrap();
            let deps: BTreeSet<EntryId> = aggregate
                .members
                .iter()
                .filter_map(|member| admitted.get(member).copied())
                .collect();

            return Ok((
                lead_atom.category,
                aggregate.complexity,
                LineageOp::AdmitUltra,
                deps.into_iter().collect(),
            ));
        }

        Err(KernelError::UnknownGlyph(*key))
    }

    /// The consume + insert + append tail of an admission. Synchronous:
    /// no cancellation point can split the pair.
    fn commit_admission(
        &self,
        key: GlyphKey,
        category: Category,
        complexity: u32,
        op: LineageOp,
        deps: Vec<EntryId>,
    ) -> Result<AdmissionReceipt> {
        let leaf = GlyphHash(key.0);

        {
            let mut governor = self.governor.lock().unwrap();
            governor.consume(complexity)?;
        }
        {
            let lineage = self.lineage.read().unwrap();
            lineage.check_dependencies(&deps)?;
        }

        // Atomicity boundary: Merkle insert + lineage append.
        let was_member = self
            .forest
            .read()
            .unwrap()
            .tree(category)
            .map(|tree| tree.contains(&leaf))
            .unwrap_or(false);
        let root = self.forest.write().unwrap().insert(category, leaf);

        let appended = {
            let mut lineage = self.lineage.write().unwrap();
            lineage
                .append(op, leaf, deps, now_millis())
                .map(|entry| entry.clone())
        };

        match appended {
            Ok(entry) => {
                self.admitted.write().unwrap().insert(key, entry.id);
                tracing::debug!("admitted glyph {} into the {} ledger", key, category);
                Ok(AdmissionReceipt {
                    key,
                    category,
                    root,
                    entry,
                })
            }
            Err(e) => {
                // Roll the insert back so no partial state survives.
                // A leaf that predates this admission stays.
                if !was_member {
                    self.forest.write().unwrap().retract(category, &leaf);
                }
                Err(KernelError::CommitAtomicityFailure(e.to_string()))
            }
        }
    }

    fn category_lock(&self, category: Category) -> Arc<tokio::sync::Mutex<()>> {
        self.admission_locks
            .lock()
            .unwrap()
            .entry(category)
            .or_default()
            .clone()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reader Paths (no admission lock)
    // ─────────────────────────────────────────────────────────────────────

    /// Current Merkle root for a category.
    pub fn root(&self, category: Category) -> Option<GlyphHash> {
        self.forest.read().unwrap().root(category)
    }

    /// Current roots of all non-empty trees.
    pub fn ledger_roots(&self) -> BTreeMap<Category, GlyphHash> {
        self.forest.read().unwrap().roots()
    }

    /// Generate an inclusion proof for a committed leaf.
    pub fn prove(&self, category: Category, leaf: &GlyphHash) -> Result<MerkleProof> {
        Ok(self.forest.read().unwrap().prove(category, leaf)?)
    }

    /// Verify an inclusion proof against a root.
    pub fn verify_proof(&self, proof: &MerkleProof, root: &GlyphHash) -> bool {
        proof.verify(root)
    }

    /// Attest a batch of leaf hashes in one token.
    pub fn batch_attest(&self, category: Category, leaves: &[GlyphHash]) -> Result<Attestation> {
        Ok(self.attestor.attest(category, leaves)?)
    }

    /// Recompute-and-compare check of an attestation.
    pub fn verify_attestation(&self, attestation: &Attestation) -> bool {
        self.attestor.verify(attestation)
    }

    /// The remaining entropy budget.
    pub fn entropy_budget(&self) -> f64 {
        self.governor.lock().unwrap().budget()
    }

    /// Committed lineage entries, in append order.
    pub fn lineage_entries(&self) -> Vec<LineageEntry> {
        self.lineage.read().unwrap().entries().to_vec()
    }

    /// Latest lineage entry id for an admitted glyph.
    pub fn admitted_entry(&self, key: &GlyphKey) -> Option<EntryId> {
        self.admitted.read().unwrap().get(key).copied()
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyph_kernel_consensus::NodeRole;

    async fn seeded_system() -> GlyphSystem {
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
            .register_atomic(SymbolValue(0x02), "scan", 1)
            .unwrap();
        system
            .register_atomic(SymbolValue(0x03), "emit", 3)
            .unwrap();
        system
    }

    #[tokio::test]
    async fn test_admit_composite() {
        let system = seeded_system().await;
        let composite = system
            .compose_meta(
                [SymbolValue(0x01), SymbolValue(0x02), SymbolValue(0x03)],
                CompositionKind::Sequential,
            )
            .unwrap();

        let receipt = system
            .admit(&composite.key, ConsensusLevel::Local)
            .await
            .unwrap();

        assert_eq!(receipt.category, Category::Control);
        assert_eq!(system.root(Category::Control), Some(receipt.root));
        assert_eq!(system.lineage_entries().len(), 1);

        // Budget consumed: (1000 - 5) * 0.99.
        assert!((system.entropy_budget() - 985.05).abs() < 1e-9);

        // The committed leaf is provable.
        let leaf = GlyphHash(composite.key.0);
        let proof = system.prove(Category::Control, &leaf).unwrap();
        assert!(system.verify_proof(&proof, &receipt.root));
    }

    #[tokio::test]
    async fn test_admit_unknown_glyph() {
        let system = seeded_system().await;
        let ghost = GlyphKey::from_bytes([0xee; 32]);

        let err = system.admit(&ghost, ConsensusLevel::Local).await.unwrap_err();
        assert!(matches!(&err, KernelError::UnknownGlyph(k) if *k == ghost));
        assert_eq!(err.stage(), Some(crate::error::AdmissionStage::Compose));
    }

    #[tokio::test]
    async fn test_admit_without_nodes_fails_consensus() {
        let system = GlyphSystem::default();
        system
            .register_atomic(SymbolValue(0x01), "init", 1)
            .unwrap();
        system
            .register_atomic(SymbolValue(0x02), "scan", 1)
            .unwrap();
        system
            .register_atomic(SymbolValue(0x03), "emit", 1)
            .unwrap();
        let composite = system
            .compose_meta(
                [SymbolValue(0x01), SymbolValue(0x02), SymbolValue(0x03)],
                CompositionKind::Sequential,
            )
            .unwrap();

        let err = system
            .admit(&composite.key, ConsensusLevel::Local)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(crate::error::AdmissionStage::Consensus));
        // No partial mutation: ledger and lineage untouched.
        assert!(system.ledger_roots().is_empty());
        assert!(system.lineage_entries().is_empty());
    }

    #[tokio::test]
    async fn test_admit_aggregate_wires_dependencies() {
        let system = seeded_system().await;
        let members = [SymbolValue(0x01), SymbolValue(0x02), SymbolValue(0x03)];

        let m1 = system
            .compose_meta(members, CompositionKind::Sequential)
            .unwrap();
        let m2 = system
            .compose_meta(members, CompositionKind::Parallel)
            .unwrap();
        let m3 = system
            .compose_meta(members, CompositionKind::Pipeline)
            .unwrap();

        let r1 = system.admit(&m1.key, ConsensusLevel::Local).await.unwrap();
        let r2 = system.admit(&m2.key, ConsensusLevel::Local).await.unwrap();

        let aggregate = system
            .compose_ultra([m1.key, m2.key, m3.key], ProgramType::new("pipeline"))
            .unwrap();
        let receipt = system
            .admit(&aggregate.key, ConsensusLevel::Local)
            .await
            .unwrap();

        // Admitted members became causal dependencies; the unadmitted
        // one did not.
        let mut expected: Vec<EntryId> = vec![r1.entry.id, r2.entry.id];
        expected.sort();
        let mut got = receipt.entry.dependencies.clone();
        got.sort();
        assert_eq!(got, expected);
        assert!(receipt.entry.clock.descends(&r1.entry.clock));
    }

    #[tokio::test]
    async fn test_readmission_is_idempotent_on_the_tree() {
        let system = seeded_system().await;
        let composite = system
            .compose_meta(
                [SymbolValue(0x01), SymbolValue(0x02), SymbolValue(0x03)],
                CompositionKind::Sequential,
            )
            .unwrap();

        let first = system
            .admit(&composite.key, ConsensusLevel::Local)
            .await
            .unwrap();
        let second = system
            .admit(&composite.key, ConsensusLevel::Local)
            .await
            .unwrap();

        // Same leaf set, same root; the lineage records both admissions.
        assert_eq!(first.root, second.root);
        assert_eq!(system.lineage_entries().len(), 2);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_blocks_admission() {
        let config = GlyphSystemConfig {
            governor: GovernorConfig {
                initial_budget: 4.0,
                unit_cost: 1.0,
                max_per_operation: 100.0,
                decay_rate: 0.0,
            },
            ..GlyphSystemConfig::default()
        };
        let system = GlyphSystem::new(config);
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
            .register_atomic(SymbolValue(0x02), "scan", 1)
            .unwrap();
        system
            .register_atomic(SymbolValue(0x03), "emit", 3)
            .unwrap();

        let composite = system
            .compose_meta(
                [SymbolValue(0x01), SymbolValue(0x02), SymbolValue(0x03)],
                CompositionKind::Sequential,
            )
            .unwrap();

        // cost 5 > budget 4.
        let err = system
            .admit(&composite.key, ConsensusLevel::Local)
            .await
            .unwrap_err();
        assert!(matches!(&err, KernelError::InsufficientBudget { cost, .. } if *cost == 5.0));
        assert_eq!(err.stage(), Some(crate::error::AdmissionStage::Budget));
        // Nothing was written.
        assert!(system.ledger_roots().is_empty());
        assert_eq!(system.entropy_budget(), 4.0);
    }

    #[tokio::test]
    async fn test_independent_instances_do_not_share_state() {
        let a = seeded_system().await;
        let b = GlyphSystem::default();

        let composite = a
            .compose_meta(
                [SymbolValue(0x01), SymbolValue(0x02), SymbolValue(0x03)],
                CompositionKind::Sequential,
            )
            .unwrap();
        a.admit(&composite.key, ConsensusLevel::Local).await.unwrap();

        assert!(a.root(Category::Control).is_some());
        assert!(b.root(Category::Control).is_none());
        assert!(b.atomic(SymbolValue(0x01)).is_none());
    }
}
