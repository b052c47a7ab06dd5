//! Append-only fact storage with idempotent insertion.

use crate::jsonl::{self, JsonlError};
use crate::predicate::{Fact, FactId, Predicate};
use std::collections::BTreeMap;
use std::path::Path;

/// The asserted facts, keyed by content-addressed identity.
///
/// Monotonic: facts are never removed or overwritten. Insertion is
/// idempotent, which is what keeps the forward-chaining loop from
/// re-deriving the same fact forever.
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    facts: BTreeMap<FactId, Fact>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a predicate, returning its id and whether it was new.
    pub fn insert(&mut self, pred: Predicate) -> (FactId, bool) {
        let fact = Fact::new(pred);
        let id = fact.id.clone();
        let newly = !self.facts.contains_key(&id);
        if newly {
            self.facts.insert(id.clone(), fact);
        }
        (id, newly)
    }

    pub fn contains(&self, id: &FactId) -> bool {
        self.facts.contains_key(id)
    }

    /// Whether this exact predicate has been asserted.
    pub fn contains_pred(&self, pred: &Predicate) -> bool {
        self.contains(&FactId::of(pred))
    }

    pub fn get(&self, id: &FactId) -> Option<&Fact> {
        self.facts.get(id)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Iterate facts in deterministic id order.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.values()
    }

    /// Persist the fact set as JSONL, atomically replacing the file.
    pub fn save_jsonl(&self, path: impl AsRef<Path>) -> Result<(), JsonlError> {
        jsonl::save(path, self.facts.values())
    }

    /// Load a fact set from a JSONL file. The reader verifies every
    /// line's stored id against the recomputed hash of its predicate.
    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self, JsonlError> {
        let mut set = Self::new();
        for fact in jsonl::load(path)? {
            set.facts.insert(fact.id.clone(), fact);
        }
        Ok(set)
    }
}
