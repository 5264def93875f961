//! The lineage log: CRDT-style causal history of admitted entries.
//!
//! Entries form a grow-only set. Each entry carries a vector clock
//! merged from the writer's local counter and the clocks of its causal
//! dependencies, so concurrent entries from different writers coexist
//! without conflict resolution. Reconciliation of concurrent entries is
//! an external collaborator's decision, not this crate's.

use std::collections::BTreeMap;
use std::fmt;

use ciborium::value::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use glyph_kernel_core::canonical::content_hash;
use glyph_kernel_core::{GlyphHash, WriterId};

use crate::error::LedgerError;

/// Domain prefix for lineage entry ids.
const ENTRY_DOMAIN: &[u8] = b"glyph-entry-v0:";

/// A 32-byte lineage entry identifier, derived from canonical entry
/// content. Immutable post-commit by construction: any change to the
/// content changes the id. Serializes as a hex string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub [u8; 32]);

impl EntryId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
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

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Operation recorded by a lineage entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LineageOp {
    /// Admission of a composite glyph.
    AdmitMeta = 0,
    /// Admission of an aggregate glyph.
    AdmitUltra = 1,
}

impl LineageOp {
    /// Convert to u8 for canonical encoding.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// A per-writer logical clock.
///
/// Each writer's component is monotonically non-decreasing: `increment`
/// bumps the local component and `merge` takes the per-writer maximum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock(BTreeMap<WriterId, u64>);

impl VectorClock {
    /// The empty clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// The component for a writer (0 if never seen).
    pub fn get(&self, writer: &WriterId) -> u64 {
        self.0.get(writer).copied().unwrap_or(0)
    }

    /// Bump a writer's component by one, returning the new value.
    pub fn increment(&mut self, writer: WriterId) -> u64 {
        let counter = self.0.entry(writer).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Merge another clock in: per-writer maximum.
    pub fn merge(&mut self, other: &VectorClock) {
        for (writer, &counter) in &other.0 {
            let entry = self.0.entry(*writer).or_insert(0);
            if counter > *entry {
                *entry = counter;
            }
        }
    }

    /// Whether this clock is at or past `other` on every component.
    pub fn descends(&self, other: &VectorClock) -> bool {
        other
            .0
            .iter()
            .all(|(writer, &counter)| self.get(writer) >= counter)
    }

    /// Whether neither clock descends the other.
    pub fn concurrent(&self, other: &VectorClock) -> bool {
        !self.descends(other) && !other.descends(self)
    }

    /// Iterate (writer, counter) pairs in writer order.
    pub fn iter(&self) -> impl Iterator<Item = (&WriterId, &u64)> {
        self.0.iter()
    }

    fn to_canonical_value(&self) -> Value {
        Value::Map(
            self.0
                .iter()
                .map(|(writer, &counter)| {
                    (Value::Bytes(writer.0.to_vec()), Value::Integer(counter.into()))
                })
                .collect(),
        )
    }
}

/// One committed entry of causal history. Immutable post-commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEntry {
    /// Content-derived identifier.
    pub id: EntryId,

    /// Writer that appended this entry.
    pub writer: WriterId,

    /// Commit timestamp (Unix milliseconds). Informational; causal order
    /// comes from the clock, not the wall clock.
    pub timestamp: i64,

    /// The recorded operation.
    pub operation: LineageOp,

    /// Deterministic hash of the admitted data.
    pub data_hash: GlyphHash,

    /// Clock at commit: dependency clocks merged, writer bumped.
    pub clock: VectorClock,

    /// Causal dependencies within the log.
    pub dependencies: Vec<EntryId>,
}

impl LineageEntry {
    /// Derive the entry id from canonical content.
    fn derive_id(
        writer: &WriterId,
        timestamp: i64,
        operation: LineageOp,
        data_hash: &GlyphHash,
        clock: &VectorClock,
        dependencies: &[EntryId],
    ) -> EntryId {
        let value = Value::Map(vec![
            (Value::Integer(0.into()), Value::Integer(0u8.into())),
            (Value::Integer(1.into()), Value::Bytes(writer.0.to_vec())),
            (Value::Integer(2.into()), Value::Integer(timestamp.into())),
            (
                Value::Integer(3.into()),
                Value::Integer(operation.to_u8().into()),
            ),
            (Value::Integer(4.into()), Value::Bytes(data_hash.0.to_vec())),
            (Value::Integer(5.into()), clock.to_canonical_value()),
            (
                Value::Integer(6.into()),
                Value::Array(
                    dependencies
                        .iter()
                        .map(|d| Value::Bytes(d.0.to_vec()))
                        .collect(),
                ),
            ),
        ]);
        EntryId(content_hash(ENTRY_DOMAIN, &value).0)
    }
}

/// The grow-only, causally-ordered log of one kernel instance.
pub struct LineageLog {
    writer: WriterId,
    clock: VectorClock,
    entries: Vec<LineageEntry>,
    index: BTreeMap<EntryId, usize>,
}

impl LineageLog {
    /// Create an empty log for a local writer.
    pub fn new(writer: WriterId) -> Self {
        Self {
            writer,
            clock: VectorClock::new(),
            entries: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// The local writer identity.
    pub fn writer(&self) -> WriterId {
        self.writer
    }

    /// The local writer's current clock.
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Whether an entry id is in the log.
    pub fn contains(&self, id: &EntryId) -> bool {
        self.index.contains_key(id)
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &EntryId) -> Option<&LineageEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Verify all dependencies are present, without mutating anything.
    ///
    /// Callers run this before the paired ledger commit so the append
    /// half cannot fail mid-transaction.
    pub fn check_dependencies(&self, dependencies: &[EntryId]) -> Result<(), LedgerError> {
        for dep in dependencies {
            if !self.index.contains_key(dep) {
                return Err(LedgerError::UnknownDependency(*dep));
            }
        }
        Ok(())
    }

    /// Append a new local entry.
    ///
    /// Merges dependency clocks into the local clock (per-writer max),
    /// bumps the local writer's component, and derives the entry id.
    pub fn append(
        &mut self,
        operation: LineageOp,
        data_hash: GlyphHash,
        dependencies: Vec<EntryId>,
        timestamp: i64,
    ) -> Result<&LineageEntry, LedgerError> {
        self.check_dependencies(&dependencies)?;

        for dep in &dependencies {
            let dep_clock = self.get(dep).map(|e| e.clock.clone());
            if let Some(dep_clock) = dep_clock {
                self.clock.merge(&dep_clock);
            }
        }
        self.clock.increment(self.writer);

        let entry = LineageEntry {
            id: LineageEntry::derive_id(
                &self.writer,
                timestamp,
                operation,
                &data_hash,
                &self.clock,
                &dependencies,
            ),
            writer: self.writer,
            timestamp,
            operation,
            data_hash,
            clock: self.clock.clone(),
            dependencies,
        };

        let index = self.entries.len();
        self.index.insert(entry.id, index);
        self.entries.push(entry);
        Ok(&self.entries[index])
    }

    /// Integrate an entry authored elsewhere (import, or a concurrent
    /// writer). Grow-only set semantics: a known id is a no-op. The
    /// foreign clock is merged so the local component ordering stays
    /// monotone.
    pub fn integrate(&mut self, entry: LineageEntry) -> Result<(), LedgerError> {
        if self.index.contains_key(&entry.id) {
            return Ok(());
        }
        self.check_dependencies(&entry.dependencies)?;

        self.clock.merge(&entry.clock);
        let index = self.entries.len();
        self.index.insert(entry.id, index);
        self.entries.push(entry);
        Ok(())
    }

    /// Entries in append order.
    pub fn entries(&self) -> &[LineageEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
