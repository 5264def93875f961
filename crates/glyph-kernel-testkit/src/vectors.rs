//! Deterministic vectors for cross-instance verification.
//!
//! Every instance of the kernel must derive identical content keys and
//! descriptions from identical registry state. Vectors are generated,
//! never hard-coded: the assertion is that two independent generations
//! agree byte for byte.

use serde::{Deserialize, Serialize};

use glyph_kernel::{
    CompositionKind, ProtocolTable, SymbolRegistry, SymbolValue,
};
use glyph_kernel_core::composer::compose_meta;

/// A single composition vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphVector {
    pub name: String,
    pub kind: CompositionKind,
    pub members: [u32; 3],
    /// Derived outputs.
    pub key_hex: String,
    pub description: String,
    pub complexity: u32,
}

/// Build the fixed registry every vector is derived against.
fn vector_registry() -> SymbolRegistry {
    let mut registry = SymbolRegistry::standard();
    registry.register(SymbolValue(0x001), "alpha", 1).unwrap();
    registry.register(SymbolValue(0x002), "beta", 2).unwrap();
    registry.register(SymbolValue(0x003), "gamma", 3).unwrap();
    registry
        .register(SymbolValue(0x00_1000), "delta", 4)
        .unwrap();
    registry
}

fn generate_vector(
    registry: &SymbolRegistry,
    protocols: &ProtocolTable,
    name: &str,
    members: [u32; 3],
    kind: CompositionKind,
) -> GlyphVector {
    let values = [
        SymbolValue(members[0]),
        SymbolValue(members[1]),
        SymbolValue(members[2]),
    ];
    let composite =
        compose_meta(registry, protocols, values, kind).expect("vector composition is valid");

    GlyphVector {
        name: name.to_string(),
        kind,
        members,
        key_hex: composite.key.to_hex(),
        description: composite.description,
        complexity: composite.complexity,
    }
}

/// Generate the full vector set.
pub fn generate_all_vectors() -> Vec<GlyphVector> {
    let registry = vector_registry();
    let protocols = ProtocolTable::standard();

    vec![
        generate_vector(
            &registry,
            &protocols,
            "sequential_low",
            [0x001, 0x002, 0x003],
            CompositionKind::Sequential,
        ),
        generate_vector(
            &registry,
            &protocols,
            "sequential_reversed",
            [0x003, 0x002, 0x001],
            CompositionKind::Sequential,
        ),
        generate_vector(
            &registry,
            &protocols,
            "parallel_mixed_category",
            [0x001, 0x00_1000, 0x003],
            CompositionKind::Parallel,
        ),
        generate_vector(
            &registry,
            &protocols,
            "hierarchical_nested",
            [0x002, 0x001, 0x003],
            CompositionKind::Hierarchical,
        ),
        generate_vector(
            &registry,
            &protocols,
            "pipeline_prefixed",
            [0x001, 0x002, 0x00_1000],
            CompositionKind::Pipeline,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_reproduce_across_generations() {
        let first = generate_all_vectors();
        let second = generate_all_vectors();
        assert_eq!(first, second);
    }

    #[test]
    fn test_vectors_have_distinct_keys() {
        let vectors = generate_all_vectors();
        for (i, a) in vectors.iter().enumerate() {
            for b in &vectors[i + 1..] {
                assert_ne!(a.key_hex, b.key_hex, "{} and {} collide", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_vectors_roundtrip_as_json() {
        let vectors = generate_all_vectors();
        let json = serde_json::to_string_pretty(&vectors).unwrap();
        let back: Vec<GlyphVector> = serde_json::from_str(&json).unwrap();
        assert_eq!(vectors, back);
    }

    #[test]
    fn test_descriptions_follow_join_rules() {
        let vectors = generate_all_vectors();
        let by_name = |name: &str| {
            vectors
                .iter()
                .find(|v| v.name == name)
                .expect("vector present")
        };

        assert_eq!(by_name("sequential_low").description, "alpha → beta → gamma");
        assert_eq!(
            by_name("hierarchical_nested").description,
            "beta → [alpha → gamma]"
        );
        assert_eq!(
            by_name("pipeline_prefixed").description,
            "Pipeline: alpha → beta → delta"
        );
    }
}
