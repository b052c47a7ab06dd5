//! The discrimination tree: one feature test per node, prefixes shared
//! across every premise that decomposes identically.
//!
//! Nodes live in an arena owned by the [`crate::Network`]; tree edges and
//! terminal attachments are plain indices, so the parent/child/terminal
//! back-reference graph has no ownership cycles. The tree is append-only:
//! rule compilation adds nodes, dispatch only reads them.

use crate::binding::Binding;
use crate::premise::PremId;
use axon_facts::{Path, PathKind, Resolved};
use axon_lexicon::{Lexicon, TermId};

/// Handle into the network's node arena. Index 0 is the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// The value a node tests a resolved feature against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// The root tests nothing.
    Root,
    /// Negation-flag match.
    Flag(bool),
    /// For a literal node: the exact term. For a variable node
    /// (`var > 0`): the variable's range constraint.
    Term(TermId),
    /// An argument role name; structural, never constrains by value.
    Label(String),
}

/// One node of the discrimination tree.
///
/// Siblings are partitioned by `(var, test)`: no two children of the same
/// parent carry the same pair. `var == 0` is a literal occurrence;
/// `var > 0` names a premise-local slot.
#[derive(Debug, Clone)]
pub struct Node {
    pub var: u16,
    pub test: NodeTest,

    /// The path this node's children test. A node's own path is implied by
    /// its parent. Set when the first child is attached, stable afterwards.
    pub child_path: Option<Path>,

    pub children: Vec<NodeId>,

    /// The premise terminal attached here, if this node ends a premise's
    /// path list. A node can be both a branch point and a terminus.
    pub terminal: Option<PremId>,
}

impl Node {
    pub fn new(var: u16, test: NodeTest) -> Self {
        Self {
            var,
            test,
            child_path: None,
            children: Vec::new(),
            terminal: None,
        }
    }

    pub fn root() -> Self {
        Self::new(0, NodeTest::Root)
    }
}

/// Kind-specific candidate selection: which children of `parent` accept a
/// feature resolved to `value` under the current binding.
///
/// - Negation: children whose stored flag equals the value.
/// - Label: all children, unconditionally — labels partition structure,
///   not content, and a missing value also matches all children (absence
///   is only meaningful here).
/// - Verb/Entity: literal children matching the term; then, if the term is
///   already bound to a slot, the children tagged with that slot;
///   otherwise variable children whose slot is still unbound and whose
///   range constraint is among the term's type ancestors (for entity
///   features, also its instance ancestors). A slot bound to a different
///   value never rebinds. A missing value matches nothing.
pub(crate) fn candidate_children(
    arena: &[Node],
    parent: &Node,
    kind: PathKind,
    value: Option<&Resolved>,
    binding: &Binding,
    lexicon: &Lexicon,
) -> Vec<NodeId> {
    match kind {
        PathKind::Label => parent.children.clone(),
        PathKind::Negation => {
            let Some(Resolved::Flag(flag)) = value else {
                return Vec::new();
            };
            parent
                .children
                .iter()
                .copied()
                .filter(|id| {
                    let child = &arena[id.0 as usize];
                    child.test == NodeTest::Flag(*flag)
                })
                .collect()
        }
        PathKind::Verb | PathKind::Entity => {
            let Some(Resolved::Term(term)) = value else {
                return Vec::new();
            };
            let term = *term;
            let mut out = Vec::new();
            for id in &parent.children {
                let child = &arena[id.0 as usize];
                if child.var == 0 && child.test == NodeTest::Term(term) {
                    out.push(*id);
                }
            }
            if let Some(slot) = binding.slot_of(term) {
                for id in &parent.children {
                    let child = &arena[id.0 as usize];
                    if child.var == slot {
                        out.push(*id);
                    }
                }
            } else {
                let type_ancestors = lexicon.type_ancestors(term);
                let instance_ancestors = if kind == PathKind::Entity {
                    lexicon.instance_ancestors(term)
                } else {
                    Vec::new()
                };
                for id in &parent.children {
                    let child = &arena[id.0 as usize];
                    if child.var == 0 || binding.get(child.var).is_some() {
                        continue;
                    }
                    let NodeTest::Term(constraint) = &child.test else {
                        continue;
                    };
                    if type_ancestors.contains(constraint)
                        || instance_ancestors.contains(constraint)
                    {
                        out.push(*id);
                    }
                }
            }
            out
        }
    }
}
