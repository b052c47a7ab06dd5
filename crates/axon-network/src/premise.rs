//! Premise terminals: the per-premise match stores the join engine reads.

use crate::binding::Binding;
use crate::node::NodeId;
use crate::rule::RuleId;

/// Handle into the network's premise arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PremId(pub u32);

/// The terminal attached to the last node of a premise's path chain.
///
/// Stores every distinct variable assignment ever observed for the premise
/// (matches are knowledge: never deleted, never overwritten) and the rules
/// that use this premise. A single terminal can serve many rules — each
/// translates the slot-keyed bindings through its own varname table.
#[derive(Debug, Clone)]
pub struct PremNode {
    node: NodeId,
    matches: Vec<Binding>,
    rules: Vec<RuleId>,
}

impl PremNode {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            matches: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// The tree node this terminal hangs off.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Record a binding. Returns `false` when an identical assignment is
    /// already stored; the caller skips the join in that case, since every
    /// candidate it could produce has been produced before.
    pub fn record(&mut self, binding: Binding) -> bool {
        if self
            .matches
            .iter()
            .any(|stored| stored.same_assignment(&binding))
        {
            return false;
        }
        self.matches.push(binding);
        true
    }

    /// Stored matches, in arrival order.
    pub fn matches(&self) -> &[Binding] {
        &self.matches
    }

    pub fn add_rule(&mut self, rule: RuleId) {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }

    /// Rules referencing this terminal as a premise.
    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }
}
