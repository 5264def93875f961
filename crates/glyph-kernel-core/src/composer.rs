//! The glyph composer: builds composite and aggregate records from
//! validated members.
//!
//! Composition is deterministic: identical inputs against identical
//! registry state reproduce identical content keys and descriptions.
//! That property is what makes ledger roots reproducible across
//! instances, and it is asserted by tests here and in the testkit.

use serde::{Deserialize, Serialize};

use crate::canonical::{meta_key, ultra_key};
use crate::error::ValidationError;
use crate::protocol::ProtocolTable;
use crate::registry::SymbolRegistry;
use crate::symbol::{
    AggregateSymbol, AtomicSymbol, CompositeSymbol, CompositionKind, ProgramType,
};
use crate::types::{GlyphKey, SymbolValue};

/// Tunables for composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Cap on an aggregate's estimated expansion size.
    pub size_cap: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self { size_cap: 256.0 }
    }
}

/// Base size contribution: 1.0 per member, 3 members per composition.
const SIZE_BASE: f64 = 3.0;

/// Build a composite from exactly 3 registered atomics.
///
/// Resolves each member (`UnknownSymbol`), validates the combination
/// against the protocol table, then derives the description, summed
/// complexity, and content key.
pub fn compose_meta(
    registry: &SymbolRegistry,
    protocols: &ProtocolTable,
    members: [SymbolValue; 3],
    kind: CompositionKind,
) -> Result<CompositeSymbol, ValidationError> {
    let resolved: [&AtomicSymbol; 3] = [
        registry.resolve(members[0])?,
        registry.resolve(members[1])?,
        registry.resolve(members[2])?,
    ];

    protocols.validate(&resolved, kind)?;

    let description = join_descriptions(
        Some(kind),
        &resolved[0].meaning,
        &resolved[1].meaning,
        &resolved[2].meaning,
    );
    let complexity = resolved.iter().map(|m| m.complexity).sum();

    Ok(CompositeSymbol {
        key: meta_key(kind, &members),
        kind,
        members,
        description,
        complexity,
    })
}

/// Build an aggregate from exactly 3 retained composites.
///
/// Resolves each member by content key (`UnknownComposite`). The
/// estimated size is `3.0 x (1 + 0.1 x complexity) x multiplier`, capped
/// at the configured maximum.
pub fn compose_ultra(
    registry: &SymbolRegistry,
    members: [GlyphKey; 3],
    program_type: ProgramType,
    config: &ComposerConfig,
) -> Result<AggregateSymbol, ValidationError> {
    let resolved: [&CompositeSymbol; 3] = [
        registry.resolve_composite(&members[0])?,
        registry.resolve_composite(&members[1])?,
        registry.resolve_composite(&members[2])?,
    ];

    let flow = program_type.flow();
    let description = join_descriptions(
        flow,
        &resolved[0].description,
        &resolved[1].description,
        &resolved[2].description,
    );
    let complexity: u32 = resolved.iter().map(|m| m.complexity).sum();

    let estimated_size =
        (SIZE_BASE * (1.0 + 0.1 * complexity as f64) * size_multiplier(flow)).min(config.size_cap);

    Ok(AggregateSymbol {
        key: ultra_key(&program_type, &members),
        program_type,
        members,
        description,
        complexity,
        estimated_size,
    })
}

/// Join rule for descriptions, shared by both composition levels.
///
/// `None` is the non-flow fallback used by aggregate program types that
/// do not name a composition kind.
fn join_descriptions(flow: Option<CompositionKind>, a: &str, b: &str, c: &str) -> String {
    match flow {
        Some(CompositionKind::Sequential) => format!("{a} → {b} → {c}"),
        Some(CompositionKind::Parallel) => format!("{a} ‖ {b} ‖ {c}"),
        Some(CompositionKind::Hierarchical) => format!("{a} → [{b} → {c}]"),
        Some(CompositionKind::Pipeline) => format!("Pipeline: {a} → {b} → {c}"),
        None => format!("{a} + {b} + {c}"),
    }
}

/// Expansion multiplier per flow shape.
fn size_multiplier(flow: Option<CompositionKind>) -> f64 {
    match flow {
        Some(CompositionKind::Parallel) => 1.2,
        Some(CompositionKind::Hierarchical) => 1.5,
        Some(CompositionKind::Pipeline) => 1.3,
        Some(CompositionKind::Sequential) | None => 1.0,
    }
}
