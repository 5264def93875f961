//! Category assignment for symbol values.
//!
//! A category is derived from a symbol's value through an explicit ordered
//! range table. The table is plain inspectable data, validated once for
//! gaps and overlaps, so coverage of the whole 3-byte domain is a checked
//! property rather than an assumption buried in branching logic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::types::SymbolValue;

/// Semantic category of a symbol, derived from its value range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    /// Control primitives (branching, guards, termination).
    Control,
    /// Verbs: operations and transformations.
    Action,
    /// Nouns: data shapes and resources.
    Entity,
    /// Qualifiers applied to actions or entities.
    Modifier,
    /// Flow connectors between compositions.
    Flow,
}

impl Category {
    /// All categories, in table order.
    pub const ALL: [Category; 5] = [
        Category::Control,
        Category::Action,
        Category::Entity,
        Category::Modifier,
        Category::Flow,
    ];

    /// Stable lowercase name, used in the export document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Control => "control",
            Category::Action => "action",
            Category::Entity => "entity",
            Category::Modifier => "modifier",
            Category::Flow => "flow",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the category table: an inclusive value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRange {
    /// First value of the range (inclusive).
    pub start: u32,
    /// Last value of the range (inclusive).
    pub end: u32,
    /// Category assigned to values in the range.
    pub category: Category,
}

/// The ordered range table mapping symbol values to categories.
///
/// Invariant (checked by [`CategoryTable::new`]): ranges are ascending,
/// contiguous, and cover exactly `0 ..= SymbolValue::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    ranges: Vec<CategoryRange>,
}

impl CategoryTable {
    /// Build a table, validating full-domain coverage.
    pub fn new(ranges: Vec<CategoryRange>) -> Result<Self, ValidationError> {
        if ranges.is_empty() {
            return Err(ValidationError::BadCategoryTable("empty table".into()));
        }

        let mut expected_start = 0u32;
        for range in &ranges {
            if range.start != expected_start {
                return Err(ValidationError::BadCategoryTable(format!(
                    "gap or overlap at {:#08x}: range starts at {:#08x}",
                    expected_start, range.start
                )));
            }
            if range.end < range.start {
                return Err(ValidationError::BadCategoryTable(format!(
                    "inverted range {:#08x}..={:#08x}",
                    range.start, range.end
                )));
            }
            expected_start = match range.end.checked_add(1) {
                Some(next) => next,
                None => {
                    return Err(ValidationError::BadCategoryTable(format!(
                        "range end {:#x} beyond the symbol domain",
                        range.end
                    )))
                }
            };
        }

        if expected_start != SymbolValue::MAX + 1 {
            return Err(ValidationError::BadCategoryTable(format!(
                "table ends at {:#08x}, domain ends at {:#08x}",
                expected_start - 1,
                SymbolValue::MAX
            )));
        }

        Ok(Self { ranges })
    }

    /// The default table shipped with the kernel.
    pub fn standard() -> Self {
        Self::new(vec![
            CategoryRange { start: 0x00_0000, end: 0x00_0FFF, category: Category::Control },
            CategoryRange { start: 0x00_1000, end: 0x0F_FFFF, category: Category::Action },
            CategoryRange { start: 0x10_0000, end: 0x3F_FFFF, category: Category::Entity },
            CategoryRange { start: 0x40_0000, end: 0x7F_FFFF, category: Category::Modifier },
            CategoryRange { start: 0x80_0000, end: 0xFF_FFFF, category: Category::Flow },
        ])
        .expect("standard table covers the domain")
    }

    /// Look up the category for an in-domain value.
    ///
    /// Returns `None` only for values outside the 3-byte domain; coverage
    /// inside the domain is a table invariant.
    pub fn category_of(&self, value: SymbolValue) -> Option<Category> {
        if !value.in_domain() {
            return None;
        }
        let v = value.get();
        let idx = self
            .ranges
            .partition_point(|r| r.end < v);
        self.ranges.get(idx).map(|r| r.category)
    }

    /// The raw table rows, for inspection and export.
    pub fn ranges(&self) -> &[CategoryRange] {
        &self.ranges
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_valid() {
        let table = CategoryTable::standard();
        assert_eq!(table.ranges().len(), 5);
    }

    #[test]
    fn test_category_lookup() {
        let table = CategoryTable::standard();
        assert_eq!(table.category_of(SymbolValue(0)), Some(Category::Control));
        assert_eq!(table.category_of(SymbolValue(0x00_1000)), Some(Category::Action));
        assert_eq!(table.category_of(SymbolValue(0x12_3456)), Some(Category::Entity));
        assert_eq!(table.category_of(SymbolValue(0x40_0000)), Some(Category::Modifier));
        assert_eq!(
            table.category_of(SymbolValue(SymbolValue::MAX)),
            Some(Category::Flow)
        );
    }

    #[test]
    fn test_out_of_domain_value() {
        let table = CategoryTable::standard();
        assert_eq!(table.category_of(SymbolValue(SymbolValue::MAX + 1)), None);
    }

    #[test]
    fn test_gap_rejected() {
        let result = CategoryTable::new(vec![
            CategoryRange { start: 0, end: 0x0F_FFFF, category: Category::Control },
            // Gap: 0x10_0000 missing
            CategoryRange { start: 0x10_0001, end: 0xFF_FFFF, category: Category::Flow },
        ]);
        assert!(matches!(result, Err(ValidationError::BadCategoryTable(_))));
    }

    #[test]
    fn test_overlap_rejected() {
        let result = CategoryTable::new(vec![
            CategoryRange { start: 0, end: 0x10_0000, category: Category::Control },
            CategoryRange { start: 0x10_0000, end: 0xFF_FFFF, category: Category::Flow },
        ]);
        assert!(matches!(result, Err(ValidationError::BadCategoryTable(_))));
    }

    #[test]
    fn test_truncated_table_rejected() {
        let result = CategoryTable::new(vec![CategoryRange {
            start: 0,
            end: 0x7F_FFFF,
            category: Category::Control,
        }]);
        assert!(matches!(result, Err(ValidationError::BadCategoryTable(_))));
    }

    #[test]
    fn test_range_boundaries_exact() {
        let table = CategoryTable::standard();
        // Every boundary value lands in its own range, not a neighbor.
        assert_eq!(table.category_of(SymbolValue(0x00_0FFF)), Some(Category::Control));
        assert_eq!(table.category_of(SymbolValue(0x0F_FFFF)), Some(Category::Action));
        assert_eq!(table.category_of(SymbolValue(0x3F_FFFF)), Some(Category::Entity));
        assert_eq!(table.category_of(SymbolValue(0x7F_FFFF)), Some(Category::Modifier));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Coverage: every in-domain value has exactly one category,
            /// and it is the category of the row containing the value.
            #[test]
            fn every_domain_value_categorized(raw in 0u32..=SymbolValue::MAX) {
                let table = CategoryTable::standard();
                let value = SymbolValue(raw);

                let got = table.category_of(value);
                prop_assert!(got.is_some());

                let by_scan = table
                    .ranges()
                    .iter()
                    .find(|r| r.start <= raw && raw <= r.end)
                    .map(|r| r.category);
                prop_assert_eq!(got, by_scan);
            }
        }
    }
}
