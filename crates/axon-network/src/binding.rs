//! Variable assignments at two scopes: premise-local bindings collected
//! during dispatch, and rule-global activations produced by the join.

use axon_facts::FactId;
use axon_lexicon::TermId;
use std::collections::BTreeMap;

/// Index of a rule-global variable, into [`crate::Rule`]'s varname table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u16);

/// A premise-local variable assignment, keyed by slot number.
///
/// Slots are numbered from 1 in first-occurrence order along a premise's
/// path list; slot 0 means "not a variable" and never appears here. A
/// binding is created when a fact enters dispatch, extended copy-on-write
/// as it descends the tree, and persisted verbatim at a premise terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    fact: FactId,
    slots: BTreeMap<u16, TermId>,
}

impl Binding {
    pub fn new(fact: FactId) -> Self {
        Self {
            fact,
            slots: BTreeMap::new(),
        }
    }

    /// The fact this binding was observed from.
    pub fn fact(&self) -> &FactId {
        &self.fact
    }

    pub fn get(&self, slot: u16) -> Option<TermId> {
        self.slots.get(&slot).copied()
    }

    /// The lowest slot currently bound to `value`, if any.
    pub fn slot_of(&self, value: TermId) -> Option<u16> {
        self.slots
            .iter()
            .find(|(_, v)| **v == value)
            .map(|(slot, _)| *slot)
    }

    /// A copy of this binding with one more slot bound.
    pub fn extended(&self, slot: u16, value: TermId) -> Self {
        let mut next = self.clone();
        next.slots.insert(slot, value);
        next
    }

    pub fn slots(&self) -> impl Iterator<Item = (u16, TermId)> + '_ {
        self.slots.iter().map(|(slot, value)| (*slot, *value))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether two bindings assign exactly the same values, regardless of
    /// which fact produced them.
    pub fn same_assignment(&self, other: &Binding) -> bool {
        self.slots == other.slots
    }
}

/// A rule-global variable assignment: the unit the join engine merges and
/// the rule fires on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activation {
    vars: BTreeMap<VarId, TermId>,
}

impl Activation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, var: VarId, value: TermId) {
        self.vars.insert(var, value);
    }

    pub fn get(&self, var: VarId) -> Option<TermId> {
        self.vars.get(&var).copied()
    }

    /// Merge two activations by name equality.
    ///
    /// Succeeds only when every variable present in both carries the same
    /// value; a disagreement discards the candidate pair entirely — there
    /// are no partial merges.
    pub fn merge(&self, other: &Activation) -> Option<Activation> {
        let mut merged = self.clone();
        for (var, value) in &other.vars {
            match merged.vars.get(var) {
                Some(existing) if existing != value => return None,
                _ => {
                    merged.vars.insert(*var, *value);
                }
            }
        }
        Some(merged)
    }

    /// Whether the assignment covers all `total` varnames of a rule.
    ///
    /// Varname ids are dense (0..total), so coverage is just cardinality.
    pub fn covers(&self, total: usize) -> bool {
        self.vars.len() == total
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact() -> FactId {
        FactId("f".repeat(64))
    }

    #[test]
    fn extension_copies() {
        let original = Binding::new(fact());
        let extended = original.extended(1, TermId(7));
        assert!(original.is_empty());
        assert_eq!(extended.get(1), Some(TermId(7)));
        assert_eq!(extended.slot_of(TermId(7)), Some(1));
    }

    #[test]
    fn merge_agrees_on_shared_variables() {
        let mut a = Activation::new();
        a.bind(VarId(0), TermId(1));
        a.bind(VarId(1), TermId(2));
        let mut b = Activation::new();
        b.bind(VarId(1), TermId(2));
        b.bind(VarId(2), TermId(3));

        let merged = a.merge(&b).expect("consistent merge should succeed");
        assert_eq!(merged.len(), 3);
        assert!(merged.covers(3));
    }

    #[test]
    fn merge_conflict_discards_the_candidate() {
        let mut a = Activation::new();
        a.bind(VarId(0), TermId(1));
        let mut b = Activation::new();
        b.bind(VarId(0), TermId(9));
        assert_eq!(a.merge(&b), None);
    }

    #[test]
    fn disjoint_merge_is_a_product() {
        let mut a = Activation::new();
        a.bind(VarId(0), TermId(1));
        let mut b = Activation::new();
        b.bind(VarId(1), TermId(2));
        let merged = a.merge(&b).expect("disjoint merge should succeed");
        assert_eq!(merged.get(VarId(0)), Some(TermId(1)));
        assert_eq!(merged.get(VarId(1)), Some(TermId(2)));
    }
}
