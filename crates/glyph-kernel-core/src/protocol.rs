//! Composition protocols: the validation rules for combining symbols.
//!
//! A protocol names which categories may combine, under which composition
//! kinds, and up to which combined complexity. Validation is a pure
//! function of the protocol table and the candidate members.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::ValidationError;
use crate::symbol::{AtomicSymbol, CompositionKind};

/// A named rule set constraining compositions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionProtocol {
    /// Protocol name, unique within a table.
    pub name: String,

    /// Categories a member may belong to.
    pub allowed_categories: BTreeSet<Category>,

    /// Maximum combined complexity of the members.
    pub max_complexity: u32,

    /// Composition kinds this protocol covers.
    pub allowed_kinds: BTreeSet<CompositionKind>,
}

impl CompositionProtocol {
    /// Build a protocol from slices, for table construction.
    pub fn new(
        name: impl Into<String>,
        categories: &[Category],
        max_complexity: u32,
        kinds: &[CompositionKind],
    ) -> Self {
        Self {
            name: name.into(),
            allowed_categories: categories.iter().copied().collect(),
            max_complexity,
            allowed_kinds: kinds.iter().copied().collect(),
        }
    }
}

/// Ordered table of named protocols.
///
/// Selection is first-match in insertion order, so more specific
/// protocols belong earlier in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolTable {
    protocols: Vec<CompositionProtocol>,
}

impl ProtocolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default table shipped with the kernel: a linear protocol for
    /// sequential/pipeline flows and a branching protocol for
    /// parallel/hierarchical flows.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.insert(CompositionProtocol::new(
            "linear",
            &Category::ALL,
            15,
            &[CompositionKind::Sequential, CompositionKind::Pipeline],
        ));
        table.insert(CompositionProtocol::new(
            "branching",
            &Category::ALL,
            24,
            &[CompositionKind::Parallel, CompositionKind::Hierarchical],
        ));
        table
    }

    /// Append a protocol. Later entries only match kinds no earlier
    /// entry covers.
    pub fn insert(&mut self, protocol: CompositionProtocol) {
        self.protocols.push(protocol);
    }

    /// Look up a protocol by name.
    pub fn get(&self, name: &str) -> Option<&CompositionProtocol> {
        self.protocols.iter().find(|p| p.name == name)
    }

    /// Iterate protocols in table order.
    pub fn iter(&self) -> impl Iterator<Item = &CompositionProtocol> {
        self.protocols.iter()
    }

    /// Validate a candidate composition against the table.
    ///
    /// Selects the first protocol whose kind set contains `kind`, then
    /// checks member categories and combined complexity. Returns the
    /// matched protocol on success.
    pub fn validate<'a>(
        &'a self,
        members: &[&AtomicSymbol; 3],
        kind: CompositionKind,
    ) -> Result<&'a CompositionProtocol, ValidationError> {
        let protocol = self
            .protocols
            .iter()
            .find(|p| p.allowed_kinds.contains(&kind))
            .ok_or(ValidationError::NoMatchingProtocol { kind })?;

        for member in members {
            if !protocol.allowed_categories.contains(&member.category) {
                return Err(ValidationError::CategoryViolation {
                    value: member.value.get(),
                    category: member.category,
                    protocol: protocol.name.clone(),
                });
            }
        }

        let total: u32 = members.iter().map(|m| m.complexity).sum();
        if total > protocol.max_complexity {
            return Err(ValidationError::ComplexityExceeded {
                total,
                max: protocol.max_complexity,
                protocol: protocol.name.clone(),
            });
        }

        Ok(protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymbolValue;

    fn atom(value: u32, category: Category, complexity: u32) -> AtomicSymbol {
        AtomicSymbol {
            value: SymbolValue(value),
            category,
            complexity,
            meaning: format!("atom-{value:x}"),
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn test_validate_ok() {
        let table = ProtocolTable::standard();
        let a = atom(1, Category::Control, 1);
        let b = atom(2, Category::Control, 1);
        let c = atom(3, Category::Control, 3);

        let protocol = table
            .validate(&[&a, &b, &c], CompositionKind::Sequential)
            .unwrap();
        assert_eq!(protocol.name, "linear");
    }

    #[test]
    fn test_no_matching_protocol() {
        let mut table = ProtocolTable::new();
        table.insert(CompositionProtocol::new(
            "linear-only",
            &Category::ALL,
            15,
            &[CompositionKind::Sequential],
        ));

        let a = atom(1, Category::Control, 1);
        let result = table.validate(&[&a, &a, &a], CompositionKind::Parallel);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::NoMatchingProtocol {
                kind: CompositionKind::Parallel
            }
        );
    }

    #[test]
    fn test_category_violation() {
        let mut table = ProtocolTable::new();
        table.insert(CompositionProtocol::new(
            "actions-only",
            &[Category::Action],
            15,
            &[CompositionKind::Sequential],
        ));

        let a = atom(0x1000, Category::Action, 1);
        let b = atom(0x2000, Category::Action, 1);
        let flow = atom(0x80_0000, Category::Flow, 1);

        let result = table.validate(&[&a, &b, &flow], CompositionKind::Sequential);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::CategoryViolation {
                value: 0x80_0000,
                category: Category::Flow,
                protocol: "actions-only".into(),
            }
        );
    }

    #[test]
    fn test_complexity_exceeded() {
        let table = ProtocolTable::standard();
        let a = atom(1, Category::Control, 6);
        let b = atom(2, Category::Control, 6);
        let c = atom(3, Category::Control, 6);

        let result = table.validate(&[&a, &b, &c], CompositionKind::Sequential);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::ComplexityExceeded {
                total: 18,
                max: 15,
                protocol: "linear".into(),
            }
        );
    }

    #[test]
    fn test_complexity_boundary_admits() {
        let table = ProtocolTable::standard();
        let a = atom(1, Category::Control, 5);
        let b = atom(2, Category::Control, 5);
        let c = atom(3, Category::Control, 5);

        // Sum exactly equals the max: valid.
        assert!(table
            .validate(&[&a, &b, &c], CompositionKind::Sequential)
            .is_ok());
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = ProtocolTable::new();
        table.insert(CompositionProtocol::new(
            "strict",
            &[Category::Action],
            5,
            &[CompositionKind::Sequential],
        ));
        table.insert(CompositionProtocol::new(
            "loose",
            &Category::ALL,
            100,
            &[CompositionKind::Sequential],
        ));

        // The strict protocol matches first and rejects; the loose one
        // is never consulted.
        let flow = atom(0x80_0000, Category::Flow, 1);
        let result = table.validate(&[&flow, &flow, &flow], CompositionKind::Sequential);
        assert!(matches!(
            result,
            Err(ValidationError::CategoryViolation { .. })
        ));
    }
}
