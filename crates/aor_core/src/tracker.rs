use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::{debug, trace};

use crate::path::FieldPath;
use crate::value::SaveValue;

/// What a dirty path held before the session touched it.
#[derive(Debug, Clone, PartialEq)]
pub enum Baseline {
    Value(SaveValue),
    /// List insertion or removal; has no comparable original.
    Structural,
}

/// Pending-change bookkeeping for one editing session.
///
/// A scalar path is tracked exactly while its current value differs from the
/// value it held at load or reset. Only the first original is remembered, so a
/// path is reconciled when an edit lands back on that value.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    originals: BTreeMap<FieldPath, Baseline>,
    stamp: u64,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_change(&mut self, path: FieldPath, old: SaveValue, new: &SaveValue) {
        match self.originals.entry(path) {
            Entry::Vacant(slot) => {
                if old != *new {
                    trace!(path = %slot.key(), "field marked dirty");
                    slot.insert(Baseline::Value(old));
                }
            }
            Entry::Occupied(slot) => {
                if matches!(slot.get(), Baseline::Value(original) if original == new) {
                    trace!(path = %slot.key(), "field restored to original");
                    slot.remove();
                }
            }
        }
    }

    pub fn record_structural_change(&mut self, path: FieldPath) {
        debug!(path = %path, "structural change recorded");
        self.originals.insert(path, Baseline::Structural);
    }

    pub fn pending_count(&self) -> usize {
        self.originals.len()
    }

    pub fn is_dirty(&self, path: &FieldPath) -> bool {
        self.originals.contains_key(path)
    }

    pub fn original(&self, path: &FieldPath) -> Option<&Baseline> {
        self.originals.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &Baseline)> {
        self.originals.iter()
    }

    /// Canonical strings of every pending path.
    pub fn pending_paths(&self) -> Vec<String> {
        self.originals.keys().map(ToString::to_string).collect()
    }

    /// Empties the pending set. Stamps keep counting so structural paths from
    /// before a reset never collide with later ones.
    pub fn clear(&mut self) {
        self.originals.clear();
    }

    pub fn next_stamp(&mut self) -> u64 {
        self.stamp += 1;
        self.stamp
    }
}
