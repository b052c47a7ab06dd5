//! Interned terms and their handles.

use serde::{Deserialize, Serialize};

/// Opaque handle for an interned term.
///
/// Handles index the lexicon's arena and stay valid for the lifetime of the
/// lexicon; terms are never removed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TermId(pub u32);

impl std::fmt::Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// What sort of term a name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    /// A noun class, e.g. `person`. Types form a hierarchy rooted at `thing`.
    Type,

    /// A proper name, e.g. `john`. Entities carry a declared type and may
    /// additionally specialize other entities (instance bases).
    Entity,

    /// A predicate word, e.g. `loves`. Verbs form a hierarchy rooted at
    /// `exists` and declare labeled argument slots.
    Verb,

    /// A rule variable, e.g. `Person1`. Ranges over the term its name
    /// derives from.
    Variable,
}

/// A labeled argument slot declared by a verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSlot {
    /// Role name of the argument, e.g. `who`.
    pub label: String,

    /// Type an argument filling this slot must be an instance of.
    pub ty: TermId,
}

/// One interned term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermEntry {
    pub name: String,
    pub kind: TermKind,

    /// For an entity: its declared type. For a variable: its range term.
    /// `None` for types and verbs.
    pub ty: Option<TermId>,

    /// For types and verbs: supertypes. For entities: instance bases.
    /// Empty for variables.
    pub bases: Vec<TermId>,

    /// Argument slots; verbs only. Does not include inherited slots —
    /// see [`crate::Lexicon::verb_args`].
    pub args: Vec<ArgSlot>,
}
