//! Per-category Merkle trees over admitted leaf hashes.
//!
//! The root is a pure function of the *sorted* leaf set: leaves are kept
//! in a `BTreeSet` and sorted lexicographically before pairing, so two
//! instances that admitted the same leaves in any order agree on the
//! root. Pairing hashes `Blake3(left || right)` level by level; an
//! unpaired trailing node is promoted unchanged.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use glyph_kernel_core::{Category, GlyphHash};

use crate::error::LedgerError;

/// Which side a proof sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Sibling is the left input of the parent hash.
    Left,
    /// Sibling is the right input of the parent hash.
    Right,
}

/// An inclusion proof: the sibling chain from a leaf up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: GlyphHash,
    /// Sibling hashes, leaf level first. Levels where the node was
    /// promoted unpaired contribute no sibling.
    pub siblings: Vec<GlyphHash>,
    /// Side of each sibling in `siblings`.
    pub directions: Vec<Direction>,
}

impl MerkleProof {
    /// Replay the hash chain and compare against `root`.
    pub fn verify(&self, root: &GlyphHash) -> bool {
        if self.siblings.len() != self.directions.len() {
            return false;
        }
        let mut current = self.leaf;
        for (sibling, direction) in self.siblings.iter().zip(&self.directions) {
            current = match direction {
                Direction::Left => GlyphHash::combine(sibling, &current),
                Direction::Right => GlyphHash::combine(&current, sibling),
            };
        }
        current == *root
    }
}

/// The Merkle tree for a single category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTree {
    leaves: BTreeSet<GlyphHash>,
    root: Option<GlyphHash>,
    depth: usize,
}

impl CategoryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a leaf and recompute the root. Inserting a leaf that is
    /// already present is idempotent. Returns the new root.
    pub fn insert(&mut self, leaf: GlyphHash) -> GlyphHash {
        self.leaves.insert(leaf);
        self.recompute();
        self.root.expect("non-empty tree has a root")
    }

    /// Remove a leaf inserted by the failing half of a paired commit.
    ///
    /// This is strictly the rollback path of the admission atomicity
    /// boundary; committed history is never retracted.
    pub fn retract(&mut self, leaf: &GlyphHash) -> bool {
        let removed = self.leaves.remove(leaf);
        if removed {
            self.recompute();
        }
        removed
    }

    /// Whether the leaf is a current member.
    pub fn contains(&self, leaf: &GlyphHash) -> bool {
        self.leaves.contains(leaf)
    }

    /// The current root, `None` for an empty tree.
    pub fn root(&self) -> Option<GlyphHash> {
        self.root
    }

    /// Number of hashing levels between the leaves and the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Leaves in sorted order.
    pub fn leaves(&self) -> impl Iterator<Item = &GlyphHash> {
        self.leaves.iter()
    }

    /// Generate an inclusion proof for `leaf`.
    pub fn prove(&self, category: Category, leaf: &GlyphHash) -> Result<MerkleProof, LedgerError> {
        if !self.leaves.contains(leaf) {
            return Err(LedgerError::LeafNotFound {
                category,
                leaf: *leaf,
            });
        }

        let mut level: Vec<GlyphHash> = self.leaves.iter().copied().collect();
        let mut index = level
            .iter()
            .position(|l| l == leaf)
            .expect("membership checked above");

        let mut siblings = Vec::new();
        let mut directions = Vec::new();

        while level.len() > 1 {
            if index % 2 == 0 {
                if let Some(sibling) = level.get(index + 1) {
                    siblings.push(*sibling);
                    directions.push(Direction::Right);
                }
                // else: unpaired trailing node, promoted with no sibling
            } else {
                siblings.push(level[index - 1]);
                directions.push(Direction::Left);
            }
            level = next_level(&level);
            index /= 2;
        }

        Ok(MerkleProof {
            leaf: *leaf,
            siblings,
            directions,
        })
    }

    fn recompute(&mut self) {
        if self.leaves.is_empty() {
            self.root = None;
            self.depth = 0;
            return;
        }

        let mut level: Vec<GlyphHash> = self.leaves.iter().copied().collect();
        let mut depth = 0;
        while level.len() > 1 {
            level = next_level(&level);
            depth += 1;
        }
        self.root = Some(level[0]);
        self.depth = depth;
    }
}

/// Pairwise-hash one level into the next, promoting an unpaired trailing
/// node unchanged.
fn next_level(level: &[GlyphHash]) -> Vec<GlyphHash> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    for pair in level.chunks(2) {
        match pair {
            [left, right] => next.push(GlyphHash::combine(left, right)),
            [odd] => next.push(*odd),
            _ => unreachable!("chunks(2) yields 1- or 2-element slices"),
        }
    }
    next
}

/// One Merkle tree per category, created lazily on first insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleForest {
    trees: BTreeMap<Category, CategoryTree>,
}

impl MerkleForest {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a leaf into the category's tree, returning the new root.
    pub fn insert(&mut self, category: Category, leaf: GlyphHash) -> GlyphHash {
        self.trees.entry(category).or_default().insert(leaf)
    }

    /// Rollback half of a failed paired commit. See [`CategoryTree::retract`].
    pub fn retract(&mut self, category: Category, leaf: &GlyphHash) -> bool {
        self.trees
            .get_mut(&category)
            .map(|tree| tree.retract(leaf))
            .unwrap_or(false)
    }

    /// The tree for a category, if any leaf was ever admitted to it.
    pub fn tree(&self, category: Category) -> Option<&CategoryTree> {
        self.trees.get(&category)
    }

    /// The current root for a category.
    pub fn root(&self, category: Category) -> Option<GlyphHash> {
        self.trees.get(&category).and_then(|t| t.root())
    }

    /// Generate an inclusion proof.
    pub fn prove(&self, category: Category, leaf: &GlyphHash) -> Result<MerkleProof, LedgerError> {
        match self.trees.get(&category) {
            Some(tree) => tree.prove(category, leaf),
            None => Err(LedgerError::LeafNotFound {
                category,
                leaf: *leaf,
            }),
        }
    }

    /// Current roots of all non-empty trees, in category order.
    pub fn roots(&self) -> BTreeMap<Category, GlyphHash> {
        self.trees
            .iter()
            .filter_map(|(category, tree)| tree.root().map(|root| (*category, root)))
            .collect()
    }
}
